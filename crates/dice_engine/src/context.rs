//! The per-evaluation container.
//!
//! `Context` is the single orchestration entry point that owns every
//! collaborator a caller would otherwise have to wire up by hand: the
//! RNG, the custom-die registry, the audit trace, and the safety policy.

use std::io;

use dice_core::{
    ChaChaDiceRng, CustomDie, CustomSide, DiceRng, EngineError, Policy, Registry, Trace, Value,
};
use dice_parser::{Ast, Node};

use crate::eval::Evaluator;

/// Bitset of optional subsystems a [`Context`] enables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Features(u32);

impl Features {
    pub const NONE: Features = Features(0);
    pub const BASIC: Features = Features(0b01);
    pub const FATE: Features = Features(0b10);
    pub const ALL: Features = Features(0b11);

    pub fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Features {
    type Output = Features;
    fn bitor(self, rhs: Features) -> Features {
        Features(self.0 | rhs.0)
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::ALL
    }
}

/// The `{value, success}` pair returned by every evaluation. `value` is
/// the sentinel `0` when `success` is `false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOutcome {
    pub value: Value,
    pub success: bool,
}

impl EvalOutcome {
    fn ok(value: Value) -> Self {
        EvalOutcome { value, success: true }
    }

    fn failed() -> Self {
        EvalOutcome { value: 0, success: false }
    }
}

/// Owns the arena sizing, RNG, registry, trace, policy, and error slot for
/// one line of `parse`/`evaluate` calls.
pub struct Context {
    arena_capacity: usize,
    rng: Box<dyn DiceRng>,
    registry: Registry,
    trace: Trace,
    policy: Policy,
    error: Option<EngineError>,
    features: Features,
}

impl Context {
    /// Construct a fresh context. `FATE` auto-registers `"F"` with sides
    /// `{-1, 0, +1}`.
    pub fn new(arena_capacity: usize, features: Features) -> Self {
        let mut ctx = Context {
            arena_capacity,
            rng: Box::new(ChaChaDiceRng::default()),
            registry: Registry::new(),
            trace: Trace::new(),
            policy: Policy::default(),
            error: None,
            features,
        };
        ctx.apply_feature_defaults();
        ctx
    }

    fn apply_feature_defaults(&mut self) {
        if self.features.contains(Features::FATE) {
            self.registry.register(
                "F",
                CustomDie::new(vec![
                    CustomSide::labeled(-1, "-"),
                    CustomSide::labeled(0, " "),
                    CustomSide::labeled(1, "+"),
                ]),
            );
        }
    }

    /// Clears the error, trace, and registry, then re-applies feature
    /// defaults. The installed RNG is left in place.
    pub fn reset(&mut self) {
        self.error = None;
        self.trace.clear();
        self.registry.clear();
        self.apply_feature_defaults();
    }

    /// Installs a new RNG, disposing the previous one via its cleanup hook.
    pub fn set_rng(&mut self, rng: Box<dyn DiceRng>) {
        self.rng.cleanup();
        self.rng = rng;
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// One-line summary of the installed policy's limits, e.g. for a
    /// diagnostic command. Delegates validity to `Policy::validate`
    /// rather than duplicating its checks.
    pub fn describe_policy(&self) -> String {
        let validity = self.policy.validate().err().unwrap_or("valid");
        format!(
            "max_dice_count={}, max_sides={}, max_explosion_depth={}, \
             allow_negative_dice={}, strict_mode={} ({validity})",
            self.policy.max_dice_count,
            self.policy.max_sides,
            self.policy.max_explosion_depth,
            self.policy.allow_negative_dice,
            self.policy.strict_mode,
        )
    }

    /// `parse(ctx, s) -> AST?`. `None` on failure; the error is recorded.
    pub fn parse(&mut self, input: &str) -> Option<Ast> {
        match dice_parser::parse(input, self.arena_capacity, self.policy.strict_mode) {
            Ok(ast) => Some(ast),
            Err(e) => {
                self.record_error(e);
                None
            }
        }
    }

    /// `evaluate(ctx, AST) -> Result`.
    pub fn evaluate(&mut self, ast: &Ast) -> EvalOutcome {
        let mut evaluator = Evaluator::new(self.rng.as_mut(), &self.registry, &self.policy, &mut self.trace);
        match evaluator.eval(ast, ast.root) {
            Ok(value) => EvalOutcome::ok(value),
            Err(e) => {
                self.record_error(e);
                EvalOutcome::failed()
            }
        }
    }

    /// `roll_expression(ctx, s) -> Result` (parse then evaluate).
    pub fn roll_expression(&mut self, input: &str) -> EvalOutcome {
        match self.parse(input) {
            Some(ast) => self.evaluate(&ast),
            None => EvalOutcome::failed(),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn get_error(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.message())
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn record_error(&mut self, err: EngineError) {
        // first error wins until cleared.
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub fn register_custom_die(&mut self, name: impl Into<String>, die: CustomDie) {
        self.registry.register(name, die);
    }

    pub fn lookup_custom_die(&self, name: &str) -> Option<&CustomDie> {
        self.registry.lookup(name)
    }

    pub fn clear_custom_dice(&mut self) {
        self.registry.clear();
    }

    /// Register a named custom die from a `NAME=<inline-literal>` string,
    /// e.g. `F={-1,0,1}`.
    pub fn parse_and_register_die(&mut self, definition: &str) -> Result<(), EngineError> {
        match self.try_parse_and_register_die(definition) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.record_error(e.clone());
                Err(e)
            }
        }
    }

    fn try_parse_and_register_die(&mut self, definition: &str) -> Result<(), EngineError> {
        let (name, literal) = definition.split_once('=').ok_or(EngineError::ParseExpected {
            expected: "'NAME=<inline-literal>'",
            position: 0,
        })?;
        if name.is_empty() {
            return Err(EngineError::ParseExpected { expected: "a non-empty die name", position: 0 });
        }
        let ast = dice_parser::parse(&format!("1d{literal}"), self.arena_capacity, false)?;
        match ast.get(ast.root) {
            Node::DiceOp(op) => match &op.custom_die {
                Some(die) => {
                    self.registry.register(name, die.clone());
                    Ok(())
                }
                None => Err(EngineError::ParseExpected {
                    expected: "an inline custom-die literal",
                    position: 0,
                }),
            },
            _ => Err(EngineError::ParseExpected {
                expected: "an inline custom-die literal",
                position: 0,
            }),
        }
    }

    pub fn get_trace(&self) -> &Trace {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    pub fn format_trace_string(&self) -> String {
        self.trace.format_string()
    }

    pub fn format_trace_stream(&self, w: &mut impl io::Write) -> io::Result<()> {
        self.trace.format_stream(w)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.rng.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fate_feature_registers_f_on_create() {
        let ctx = Context::new(4096, Features::FATE);
        assert!(ctx.lookup_custom_die("F").is_some());
    }

    #[test]
    fn basic_only_does_not_register_f() {
        let ctx = Context::new(4096, Features::BASIC);
        assert!(ctx.lookup_custom_die("F").is_none());
    }

    #[test]
    fn roll_expression_reports_success_and_trace() {
        let mut ctx = Context::new(4096, Features::ALL);
        ctx.set_rng(Box::new(ChaChaDiceRng::new(42)));
        let outcome = ctx.roll_expression("3d6");
        assert!(outcome.success);
        assert!((3..=18).contains(&outcome.value));
        assert!(ctx.get_trace().len() >= 3);
    }

    #[test]
    fn parse_error_is_recorded_and_first_wins() {
        let mut ctx = Context::new(4096, Features::ALL);
        let outcome = ctx.roll_expression("invalid");
        assert!(!outcome.success);
        assert!(ctx.has_error());
        let first = ctx.get_error();
        let _ = ctx.roll_expression("also invalid");
        assert_eq!(ctx.get_error(), first);
    }

    #[test]
    fn clear_error_allows_recording_again() {
        let mut ctx = Context::new(4096, Features::ALL);
        let _ = ctx.roll_expression("invalid");
        ctx.clear_error();
        assert!(!ctx.has_error());
        let _ = ctx.roll_expression("also invalid");
        assert!(ctx.has_error());
    }

    #[test]
    fn reset_clears_trace_error_and_reapplies_fate() {
        let mut ctx = Context::new(4096, Features::FATE);
        ctx.register_custom_die("X", CustomDie::new(vec![CustomSide::new(1)]));
        let _ = ctx.roll_expression("3d6");
        let _ = ctx.roll_expression("invalid");
        ctx.reset();
        assert!(!ctx.has_error());
        assert!(ctx.get_trace().is_empty());
        assert!(ctx.lookup_custom_die("F").is_some());
        assert!(ctx.lookup_custom_die("X").is_none());
    }

    #[test]
    fn same_seed_same_result_after_reseeding() {
        let mut ctx = Context::new(4096, Features::ALL);
        ctx.set_rng(Box::new(ChaChaDiceRng::new(7)));
        let first = ctx.roll_expression("5d10");
        ctx.reset();
        ctx.set_rng(Box::new(ChaChaDiceRng::new(7)));
        let second = ctx.roll_expression("5d10");
        assert_eq!(first.value, second.value);
    }

    #[test]
    fn register_via_definition_string() {
        let mut ctx = Context::new(4096, Features::BASIC);
        ctx.parse_and_register_die("F=-1,0,1").unwrap_err(); // missing braces is not an inline literal
        ctx.parse_and_register_die("F={-1,0,1}").unwrap();
        assert_eq!(ctx.lookup_custom_die("F").unwrap().side_count(), 3);
    }

    #[test]
    fn clear_trace_starts_empty() {
        let mut ctx = Context::new(4096, Features::ALL);
        let _ = ctx.roll_expression("3d6");
        ctx.clear_trace();
        assert!(ctx.get_trace().is_empty());
    }

    #[test]
    fn describe_policy_reports_defaults_as_valid() {
        let ctx = Context::new(4096, Features::ALL);
        let summary = ctx.describe_policy();
        assert!(summary.contains("max_dice_count=1000"));
        assert!(summary.contains("(valid)"));
    }

    #[test]
    fn describe_policy_surfaces_an_invalid_policy() {
        let mut ctx = Context::new(4096, Features::ALL);
        ctx.set_policy(Policy { max_dice_count: 0, ..Policy::default() });
        assert!(ctx.describe_policy().contains("max_dice_count must be >= 1"));
    }
}
