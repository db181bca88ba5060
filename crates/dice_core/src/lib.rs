//! dice_core — arena, RNG, policy, custom-die registry, trace log, and the
//! shared error/domain types used by `dice_parser` and `dice_engine`.
//!
//! This crate owns no parsing or evaluation logic; it is the substrate the
//! rest of the engine is built on.
//!
//! Serialization derives are gated behind the `serde` feature.

pub mod arena;
pub mod error;
pub mod policy;
pub mod registry;
pub mod rng;
pub mod selection;
pub mod trace;

pub use arena::{Arena, NodeId};
pub use error::{EngineError, EngineResult};
pub use policy::{Policy, REROLL_LIMIT};
pub use registry::{CustomDie, CustomSide, Registry};
pub use rng::{ChaChaDiceRng, DiceRng};
pub use selection::{Cmp, Selection};
pub use trace::{Trace, TraceEntry};

/// The integer type used for all dice-expression evaluation.
///
/// Arithmetic on evaluated subtrees wraps on overflow: dice rolls
/// themselves are bounded by policy limits, but `+`/`-`/`*` combining already
/// evaluated results is allowed to wrap rather than panic or saturate.
pub type Value = i64;
