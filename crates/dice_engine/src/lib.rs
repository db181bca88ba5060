//! Evaluator and [`Context`] facade for the dice expression engine.
//!
//! `dice_core` supplies the substrate (arena, RNG trait, registry, trace,
//! policy, errors); `dice_parser` turns text into an `Ast`; this crate
//! walks that `Ast` and bundles the collaborators a caller needs behind
//! one [`Context`] orchestration entry point.
#![forbid(unsafe_code)]

mod context;
mod eval;

pub use context::{Context, EvalOutcome, Features};
pub use eval::Evaluator;

pub use dice_core::{
    ChaChaDiceRng, Cmp, CustomDie, CustomSide, DiceRng, EngineError, EngineResult, Policy, Registry,
    Selection, Trace, TraceEntry, Value, REROLL_LIMIT,
};
pub use dice_parser::{parse, Ast};
