use enum_map::Enum;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// A traversal purpose. Declaration order is emission order within a kind.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Enum,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum Operation {
    /// Mark every object reachable from the object's fields.
    FollowContents,
    /// Re-establish the card-mark invariant for the object's reference fields.
    UpdateCardMark,
    /// Assert that none of the object's reference fields needs a card mark.
    VerifyNoCardMark,
}

impl Operation {
    /// Does the operation mark objects, and so need to care about reference discovery?
    pub fn is_marking(&self) -> bool {
        *self == Operation::FollowContents
    }
}
