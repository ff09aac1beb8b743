//! Conditional traversal of weakly held referents.
//!
//! A reference object's referent must not be kept alive merely because the reference object is.
//! Each variant picks how it treats referents; the strategy below turns that choice into the
//! test to run and what to do on either outcome. The pending-list link next to the referent is
//! not gated: it is always visited as a normal reference.

/// How a variant treats the referent of a reference object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceHandling {
    /// Offer the reference to reference discovery. A discovered referent is traversed later by
    /// reference processing; an undiscovered one is visited now.
    Discover { collector: &'static str },
    /// Ask whether the referent must be marked through regardless of discovery. If so it is
    /// visited now; otherwise it is left to reference processing.
    MarkThrough { collector: &'static str },
    /// The referent is a normal reference.
    Strong,
}

/// What happens to the referent on one outcome of the test.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReferentAction {
    /// Leave the referent for reference processing.
    Defer,
    /// Visit the referent like any other reference.
    Visit,
}

/// The test guarding the referent visit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReferentTest {
    pub collector: &'static str,
    pub predicate: &'static str,
    pub when_true: ReferentAction,
    pub when_false: ReferentAction,
}

impl ReferentTest {
    pub fn action(&self, outcome: bool) -> ReferentAction {
        if outcome {
            self.when_true
        } else {
            self.when_false
        }
    }
}

impl ReferenceHandling {
    /// The test to run on a non-null referent, or `None` if the referent is visited unconditionally.
    pub fn test(&self) -> Option<ReferentTest> {
        match *self {
            ReferenceHandling::Discover { collector } => Some(ReferentTest {
                collector,
                predicate: "is_unmarked_and_discover_reference",
                when_true: ReferentAction::Defer,
                when_false: ReferentAction::Visit,
            }),
            ReferenceHandling::MarkThrough { collector } => Some(ReferentTest {
                collector,
                predicate: "mark_through_non_strong_ref",
                when_true: ReferentAction::Visit,
                when_false: ReferentAction::Defer,
            }),
            ReferenceHandling::Strong => None,
        }
    }

    pub fn is_gated(&self) -> bool {
        self.test().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_defers_discovered_referents() {
        let test = ReferenceHandling::Discover {
            collector: "MarkSweep",
        }
        .test()
        .unwrap();
        assert_eq!(test.action(true), ReferentAction::Defer);
        assert_eq!(test.action(false), ReferentAction::Visit);
        assert_eq!(test.collector, "MarkSweep");
    }

    #[test]
    fn mark_through_visits_when_asked() {
        let test = ReferenceHandling::MarkThrough {
            collector: "GPGC_OldCollector",
        }
        .test()
        .unwrap();
        assert_eq!(test.action(true), ReferentAction::Visit);
        assert_eq!(test.action(false), ReferentAction::Defer);
    }

    #[test]
    fn strong_is_ungated() {
        assert!(!ReferenceHandling::Strong.is_gated());
    }
}
