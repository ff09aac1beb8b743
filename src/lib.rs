//! Closuregen generates the metadata traversal routines of a managed runtime.
//!
//! Every metadata kind (klasses, constant pools, method records, ...) needs one routine per
//! (operation, collector variant) pair: follow its references for marking, update its card marks,
//! or verify that it has none. Writing those routines by hand means hundreds of near-copies that
//! drift apart. Closuregen derives all of them from two declarative tables instead:
//!
//! * the [field schema](schema) describes each kind: which fields hold references and in what
//!   role, which kind it extends, and how its fields sit around the base kind's fields,
//! * the [variant catalog](collector) describes each collector variant: the operation it serves,
//!   the primitives it calls, and how it treats weak referents and long arrays.
//!
//! The [resolver](resolve) combines the two into a [`GenerationPlan`](resolve::GenerationPlan)
//! for one triple, and the [emitter](emit) renders plans as host-language definitions.
//! [`Generator`] ties the pieces together for a whole run:
//!
//! ```ignore
//! closuregen::util::logger::try_init().ok();
//! let generator = closuregen::Generator::builtin()?;
//! let unit = generator.generate_to_string()?;
//! ```
//!
//! Generation is all-or-nothing: the catalogs are cross-checked when the generator is built, and
//! the output sink sees no text unless every routine rendered.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

pub mod collector;
pub mod emit;
mod generator;
pub mod resolve;
pub mod schema;
pub mod util;

pub use crate::collector::{CollectorVariant, Operation, VariantCatalog};
pub use crate::generator::{GenerationSummary, Generator};
pub use crate::resolve::{GenerationPlan, PlanTag};
pub use crate::schema::{FieldRegistry, ObjectKind};
pub use crate::util::error::{GenError, Result};
pub use crate::util::options::Options;
