//! AST walker implementing dice semantics.
//!
//! An `Evaluator` bundles the RNG, registry, policy, and trace a single
//! `evaluate` call needs instead of threading four parameters through
//! every recursive call.

use dice_core::{
    Cmp, CustomDie, DiceRng, EngineError, EngineResult, Policy, Registry, Trace, TraceEntry, Value,
};
use dice_parser::{Ast, BinOp, DiceKind, DiceOp, Node};

/// Where one atomic roll's faces come from: a `1..=sides` basic die or an
/// explicit-valued custom die. Resolved once per `DiceOp` evaluation so a
/// `Filter` node doesn't re-resolve the registry on every roll.
enum FaceSource {
    Basic(Value),
    Custom(CustomDie),
}

impl FaceSource {
    /// Draw one face, returning `(sides_for_trace, value)`.
    fn draw(&self, rng: &mut dyn DiceRng) -> EngineResult<(i32, Value)> {
        match self {
            FaceSource::Basic(sides) => {
                let r = rng.roll(*sides as i32);
                if r < 0 {
                    return Err(EngineError::RngFailure {
                        reason: "roll returned sentinel for already-validated sides",
                    });
                }
                Ok((*sides as i32, r as Value))
            }
            FaceSource::Custom(die) => {
                let n = die.side_count();
                let idx = rng.rand(n as u64) as usize;
                let idx = if idx >= n { idx % n } else { idx };
                Ok((n as i32, die.sides[idx].value))
            }
        }
    }
}

fn resolve_custom_die<'a>(op: &'a DiceOp, registry: &'a Registry) -> EngineResult<&'a CustomDie> {
    if let Some(die) = op.custom_die.as_ref() {
        return Ok(die);
    }
    if let Some(name) = op.custom_name.as_ref() {
        return registry
            .lookup(name)
            .ok_or_else(|| EngineError::UnknownCustomDie { name: name.clone() });
    }
    Err(EngineError::UnknownCustomDie { name: String::new() })
}

fn validate_count(count: Value, policy: &Policy) -> EngineResult<()> {
    if count < 1 {
        return Err(EngineError::InvalidDiceCount { count });
    }
    if count > policy.max_dice_count {
        return Err(EngineError::PolicyDiceCount { count, limit: policy.max_dice_count });
    }
    Ok(())
}

fn validate_sides(sides: Value, policy: &Policy) -> EngineResult<()> {
    if sides < 1 {
        return Err(EngineError::InvalidDiceSides { sides });
    }
    if sides > policy.max_sides {
        return Err(EngineError::PolicySides { sides, limit: policy.max_sides });
    }
    Ok(())
}

/// Walks one [`Ast`] against a context's collaborators. A fresh `Evaluator`
/// is built per `evaluate`/`roll_expression` call; it borrows, never owns.
pub struct Evaluator<'a> {
    rng: &'a mut dyn DiceRng,
    registry: &'a Registry,
    policy: &'a Policy,
    trace: &'a mut Trace,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        rng: &'a mut dyn DiceRng,
        registry: &'a Registry,
        policy: &'a Policy,
        trace: &'a mut Trace,
    ) -> Self {
        Evaluator { rng, registry, policy, trace }
    }

    /// Post-order evaluation; `Annotation` forwards straight to its child.
    pub fn eval(&mut self, ast: &Ast, node: dice_core::NodeId) -> EngineResult<Value> {
        match ast.get(node) {
            Node::Literal { value } => Ok(*value),
            Node::BinaryOp { op, left, right } => self.eval_binary(ast, *op, *left, *right),
            Node::DiceOp(op) => self.eval_dice_op(ast, op),
            Node::FunctionCall { name, .. } => Err(EngineError::NotSupported { what: name.clone() }),
            Node::Annotation { child, .. } => self.eval(ast, *child),
        }
    }

    fn eval_binary(
        &mut self,
        ast: &Ast,
        op: BinOp,
        left: dice_core::NodeId,
        right: dice_core::NodeId,
    ) -> EngineResult<Value> {
        let l = self.eval(ast, left)?;
        let r = self.eval(ast, right)?;
        match op {
            BinOp::Add => Ok(l.wrapping_add(r)),
            BinOp::Sub => Ok(l.wrapping_sub(r)),
            BinOp::Mul => Ok(l.wrapping_mul(r)),
            BinOp::Div => {
                if r == 0 {
                    Err(EngineError::DivisionByZero)
                } else {
                    Ok(l.wrapping_div(r))
                }
            }
        }
    }

    fn eval_dice_op(&mut self, ast: &Ast, op: &DiceOp) -> EngineResult<Value> {
        let count = match op.count {
            Some(n) => self.eval(ast, n)?,
            None => 1,
        };
        match op.kind {
            DiceKind::Basic => self.eval_basic(ast, op, count),
            DiceKind::Custom => self.eval_custom(op, count),
            DiceKind::Filter => self.eval_filter(ast, op, count),
            DiceKind::Exploding | DiceKind::Pool | DiceKind::Fate => {
                Err(EngineError::NotSupported { what: format!("{:?} dice", op.kind) })
            }
        }
    }

    fn eval_basic(&mut self, ast: &Ast, op: &DiceOp, count: Value) -> EngineResult<Value> {
        validate_count(count, self.policy)?;
        let sides_node = op.sides.ok_or(EngineError::InvalidDiceSides { sides: 0 })?;
        let sides = self.eval(ast, sides_node)?;
        validate_sides(sides, self.policy)?;
        let face = FaceSource::Basic(sides);

        let mut sum: Value = 0;
        for _ in 0..count {
            let (trace_sides, value) = face.draw(self.rng)?;
            self.trace.push(TraceEntry::new(trace_sides, value as i32, true));
            sum = sum.wrapping_add(value);
        }
        Ok(sum)
    }

    fn eval_custom(&mut self, op: &DiceOp, count: Value) -> EngineResult<Value> {
        validate_count(count, self.policy)?;
        let die = resolve_custom_die(op, self.registry)?.clone();
        if die.is_empty() {
            let name = op.custom_name.clone().or_else(|| die.name.clone()).unwrap_or_default();
            return Err(EngineError::EmptyCustomDie { name });
        }
        let face = FaceSource::Custom(die);

        let mut sum: Value = 0;
        for _ in 0..count {
            let (trace_sides, value) = face.draw(self.rng)?;
            self.trace.push(TraceEntry::new(trace_sides, value as i32, true));
            sum = sum.wrapping_add(value);
        }
        Ok(sum)
    }

    fn eval_filter(&mut self, ast: &Ast, op: &DiceOp, count: Value) -> EngineResult<Value> {
        validate_count(count, self.policy)?;

        let selection = op
            .selection
            .as_ref()
            .ok_or(EngineError::InvalidComparison)?;

        let face = if let Some(sides_node) = op.sides {
            let sides = self.eval(ast, sides_node)?;
            validate_sides(sides, self.policy)?;
            FaceSource::Basic(sides)
        } else {
            let die = resolve_custom_die(op, self.registry)?.clone();
            if die.is_empty() {
                let name = op.custom_name.clone().or_else(|| die.name.clone()).unwrap_or_default();
                return Err(EngineError::EmptyCustomDie { name });
            }
            FaceSource::Custom(die)
        };

        use dice_core::selection::FilterMode;
        match selection.mode() {
            FilterMode::Reroll(cmp, value) => self.eval_reroll(&face, count, cmp, value),
            FilterMode::Select(cmp, value) => self.eval_conditional(&face, count, cmp, value),
            FilterMode::KeepHigh(k) => self.eval_keep_drop(&face, count, k.clamp(0, count), true),
            FilterMode::KeepLow(k) => self.eval_keep_drop(&face, count, k.clamp(0, count), false),
            FilterMode::DropHigh(k) => self.eval_keep_drop(&face, count, (count - k).max(0), false),
            FilterMode::DropLow(k) => self.eval_keep_drop(&face, count, (count - k).max(0), true),
        }
    }

    fn eval_conditional(
        &mut self,
        face: &FaceSource,
        count: Value,
        op: Cmp,
        value: Value,
    ) -> EngineResult<Value> {
        let mut sum: Value = 0;
        for _ in 0..count {
            let (sides, rolled) = face.draw(self.rng)?;
            let matched = op.matches(rolled, value);
            self.trace.push(TraceEntry::new(sides, rolled as i32, matched));
            if matched {
                sum = sum.wrapping_add(rolled);
            }
        }
        Ok(sum)
    }

    /// Rerolls while `op.matches(rolled, value)` holds, tracing every
    /// rerolled-away value as `selected=false` before the final kept value.
    fn eval_reroll(
        &mut self,
        face: &FaceSource,
        count: Value,
        op: Cmp,
        value: Value,
    ) -> EngineResult<Value> {
        let mut sum: Value = 0;
        for _ in 0..count {
            let mut attempts: u32 = 0;
            loop {
                let (sides, rolled) = face.draw(self.rng)?;
                if op.matches(rolled, value) {
                    self.trace.push(TraceEntry::new(sides, rolled as i32, false));
                    attempts += 1;
                    if attempts > dice_core::REROLL_LIMIT {
                        return Err(EngineError::RerollLimitExceeded { limit: dice_core::REROLL_LIMIT });
                    }
                    continue;
                }
                self.trace.push(TraceEntry::new(sides, rolled as i32, true));
                sum = sum.wrapping_add(rolled);
                break;
            }
        }
        Ok(sum)
    }

    /// Count-based keep/drop: draw `count` faces, sort by value (descending
    /// when `select_high`), mark the first `keep_count` as selected.
    fn eval_keep_drop(
        &mut self,
        face: &FaceSource,
        count: Value,
        keep_count: Value,
        select_high: bool,
    ) -> EngineResult<Value> {
        let mut rolls: Vec<(i32, Value)> = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            rolls.push(face.draw(self.rng)?);
        }

        let mut order: Vec<usize> = (0..rolls.len()).collect();
        if select_high {
            order.sort_by(|&a, &b| rolls[b].1.cmp(&rolls[a].1));
        } else {
            order.sort_by(|&a, &b| rolls[a].1.cmp(&rolls[b].1));
        }

        let take = (keep_count.max(0) as usize).min(rolls.len());
        let mut selected = vec![false; rolls.len()];
        for &idx in order.iter().take(take) {
            selected[idx] = true;
        }

        let mut sum: Value = 0;
        for (i, (sides, value)) in rolls.iter().enumerate() {
            self.trace.push(TraceEntry::new(*sides, *value as i32, selected[i]));
            if selected[i] {
                sum = sum.wrapping_add(*value);
            }
        }
        Ok(sum)
    }
}
