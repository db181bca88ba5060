//! Recursive-descent parser for dice expressions: one function per
//! grammar rule, explicit `Result` returns, no panics.

use dice_core::{Arena, Cmp, CustomDie, CustomSide, EngineError, Selection};

use crate::ast::{Ast, BinOp, DiceKind, DiceOp, Node};
use crate::lexer::Cursor;

/// Parse `input` into an [`Ast`]. `arena_capacity` bounds the number of AST
/// nodes; `strict_mode` enables the tightened grammar (explicit dice
/// counts, no whitespace split inside a dice body).
pub fn parse(input: &str, arena_capacity: usize, strict_mode: bool) -> Result<Ast, EngineError> {
    let mut p = Parser {
        input,
        cursor: Cursor::new(input),
        arena: Arena::with_capacity(arena_capacity),
        strict_mode,
    };
    p.cursor.skip_ws();
    let root = p.parse_expression()?;
    p.cursor.skip_ws();
    if !p.cursor.is_eof() {
        return Err(EngineError::ParseUnexpectedTrailing {
            position: p.cursor.position(),
            trailing: p.cursor.rest().to_string(),
        });
    }
    Ok(Ast { nodes: p.arena, root })
}

struct Parser<'a> {
    input: &'a str,
    cursor: Cursor<'a>,
    arena: Arena<Node>,
    strict_mode: bool,
}

impl<'a> Parser<'a> {
    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    fn alloc(&mut self, node: Node) -> Result<dice_core::NodeId, EngineError> {
        self.arena.alloc(node)
    }

    // sum := product (('+'|'-') product)*
    fn parse_expression(&mut self) -> Result<dice_core::NodeId, EngineError> {
        self.parse_sum()
    }

    fn parse_sum(&mut self) -> Result<dice_core::NodeId, EngineError> {
        let mut left = self.parse_product()?;
        loop {
            self.cursor.skip_ws();
            let op = match self.cursor.peek() {
                Some('+') => BinOp::Add,
                Some('-') => BinOp::Sub,
                _ => break,
            };
            self.cursor.advance();
            self.cursor.skip_ws();
            let right = self.parse_product()?;
            left = self.alloc(Node::BinaryOp { op, left, right })?;
        }
        Ok(left)
    }

    // product := unary (('*'|'/') unary)*
    fn parse_product(&mut self) -> Result<dice_core::NodeId, EngineError> {
        let mut left = self.parse_unary()?;
        loop {
            self.cursor.skip_ws();
            let op = match self.cursor.peek() {
                Some('*') => BinOp::Mul,
                Some('/') => BinOp::Div,
                _ => break,
            };
            self.cursor.advance();
            self.cursor.skip_ws();
            let right = self.parse_unary()?;
            left = self.alloc(Node::BinaryOp { op, left, right })?;
        }
        Ok(left)
    }

    // unary := ('+'|'-') unary | primary
    fn parse_unary(&mut self) -> Result<dice_core::NodeId, EngineError> {
        self.cursor.skip_ws();
        match self.cursor.peek() {
            Some('+') => {
                self.cursor.advance();
                self.cursor.skip_ws();
                self.parse_unary()
            }
            Some('-') => {
                self.cursor.advance();
                self.cursor.skip_ws();
                let inner = self.parse_unary()?;
                let zero = self.alloc(Node::Literal { value: 0 })?;
                self.alloc(Node::BinaryOp { op: BinOp::Sub, left: zero, right: inner })
            }
            _ => self.parse_primary(),
        }
    }

    // primary := '(' expression ')' | dice | number
    fn parse_primary(&mut self) -> Result<dice_core::NodeId, EngineError> {
        self.cursor.skip_ws();
        let position = self.cursor.position();

        if self.cursor.eat_char('(') {
            self.cursor.skip_ws();
            let inner = self.parse_expression()?;
            self.cursor.skip_ws();
            if !self.cursor.eat_char(')') {
                return Err(EngineError::ParseExpected { expected: "')'", position: self.cursor.position() });
            }
            return Ok(inner);
        }

        if matches!(self.cursor.peek(), Some(c) if c.is_ascii_digit()) {
            let digits = self.cursor.eat_digits().expect("digit just peeked");
            let count_val: i64 = digits.parse().map_err(|_| EngineError::ParseExpected {
                expected: "number",
                position,
            })?;

            let mut lookahead = self.cursor.clone();
            lookahead.skip_ws_counting();
            if matches!(lookahead.peek(), Some(c) if c.eq_ignore_ascii_case(&'d')) {
                self.cursor = lookahead;
                self.cursor.advance(); // consume 'd'/'D'
                let count_node = self.alloc(Node::Literal { value: count_val })?;
                return self.parse_dice_after_d(Some(count_node));
            }

            return self.alloc(Node::Literal { value: count_val });
        }

        if matches!(self.cursor.peek(), Some(c) if c.eq_ignore_ascii_case(&'d')) {
            if self.strict_mode {
                return Err(EngineError::ParseExpected {
                    expected: "explicit dice count (e.g. '1d6') in strict mode",
                    position,
                });
            }
            self.cursor.advance();
            return self.parse_dice_after_d(None);
        }

        Err(EngineError::ParseExpected { expected: "number, dice, or '('", position })
    }

    fn parse_dice_after_d(
        &mut self,
        count: Option<dice_core::NodeId>,
    ) -> Result<dice_core::NodeId, EngineError> {
        let ws_after_d = self.cursor.skip_ws_counting();
        if self.strict_mode && ws_after_d > 0 {
            return Err(EngineError::ParseExpected {
                expected: "no whitespace between 'd' and dice body in strict mode",
                position: self.cursor.position(),
            });
        }

        let position = self.cursor.position();
        let mut dice_op = if matches!(self.cursor.peek(), Some(c) if c.is_ascii_digit()) {
            let digits = self.cursor.eat_digits().expect("digit just peeked");
            let sides_val: i64 = digits.parse().map_err(|_| EngineError::ParseExpected {
                expected: "number",
                position,
            })?;
            let sides_node = self.alloc(Node::Literal { value: sides_val })?;
            DiceOp::basic(count, sides_node, None)
        } else if self.cursor.eat_char('{') {
            let die = self.parse_custom_literal()?;
            DiceOp::custom_inline(count, die, None)
        } else if matches!(self.cursor.peek(), Some(c) if c.is_ascii_alphabetic()) {
            let name = self.cursor.eat_ident().expect("letter just peeked");
            DiceOp::custom_named(count, name.to_string(), None)
        } else {
            return Err(EngineError::ParseExpected {
                expected: "dice body ('{...}', a number, or a custom-die name)",
                position,
            });
        };

        if let Some(selection) = self.parse_selection_suffix()? {
            dice_op.kind = DiceKind::Filter;
            dice_op.selection = Some(selection);
        }

        self.alloc(Node::DiceOp(dice_op))
    }

    /// `'{' custom-side (',' custom-side)* '}'`, already past the opening
    /// brace. Sides with no explicit value take their zero-based index.
    fn parse_custom_literal(&mut self) -> Result<CustomDie, EngineError> {
        enum Spec {
            Valued(i64, Option<String>),
            StringOnly(String),
        }

        let mut specs = Vec::new();
        loop {
            self.cursor.skip_ws();
            if self.cursor.eat_char('}') {
                break;
            }
            let position = self.cursor.position();
            let spec = if self.cursor.peek() == Some('"') {
                let s = self.cursor.eat_quoted_string().ok_or(EngineError::ParseExpected {
                    expected: "closing '\"'",
                    position,
                })?;
                Spec::StringOnly(s.to_string())
            } else {
                let negative = self.cursor.eat_char('-');
                let digits = self.cursor.eat_digits().ok_or(EngineError::ParseExpected {
                    expected: "signed number or quoted string",
                    position,
                })?;
                let mut value: i64 = digits.parse().map_err(|_| EngineError::ParseExpected {
                    expected: "number",
                    position,
                })?;
                if negative {
                    value = -value;
                }
                self.cursor.skip_ws();
                if self.cursor.eat_char(':') {
                    self.cursor.skip_ws();
                    let label_pos = self.cursor.position();
                    let label = self.cursor.eat_quoted_string().ok_or(EngineError::ParseExpected {
                        expected: "quoted label",
                        position: label_pos,
                    })?;
                    Spec::Valued(value, Some(label.to_string()))
                } else {
                    Spec::Valued(value, None)
                }
            };
            specs.push(spec);

            self.cursor.skip_ws();
            if self.cursor.eat_char(',') {
                continue;
            }
            if self.cursor.eat_char('}') {
                break;
            }
            return Err(EngineError::ParseExpected {
                expected: "',' or '}'",
                position: self.cursor.position(),
            });
        }

        let sides = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| match spec {
                Spec::Valued(v, label) => match label {
                    Some(l) => CustomSide::labeled(v, l),
                    None => CustomSide::new(v),
                },
                Spec::StringOnly(label) => CustomSide::labeled(i as i64, label),
            })
            .collect();
        Ok(CustomDie::new(sides))
    }

    /// Matches one alternative of the `selection-suffix` grammar, or
    /// returns `None` if the next characters don't start one. A bare `d`
    /// not followed by `h`/`l` is accepted as the `d ≡ dl` shorthand.
    fn parse_selection_suffix(&mut self) -> Result<Option<Selection>, EngineError> {
        self.cursor.skip_ws();
        let start = self.cursor.position();
        match self.cursor.peek() {
            Some(c) if c.eq_ignore_ascii_case(&'k') => {
                self.cursor.advance();
                let select_high = if self.cursor.eat_char_ci('h') {
                    true
                } else if self.cursor.eat_char_ci('l') {
                    false
                } else {
                    true // bare 'k' ≡ 'kh'
                };
                let count = self.parse_suffix_count();
                let syntax = self.slice(start, self.cursor.position()).to_string();
                Ok(Some(Selection::keep(count, select_high, syntax)))
            }
            Some(c) if c.eq_ignore_ascii_case(&'h') => {
                self.cursor.advance();
                let count = self.parse_suffix_count();
                let syntax = self.slice(start, self.cursor.position()).to_string();
                Ok(Some(Selection::keep(count, true, syntax)))
            }
            Some(c) if c.eq_ignore_ascii_case(&'l') => {
                self.cursor.advance();
                let count = self.parse_suffix_count();
                let syntax = self.slice(start, self.cursor.position()).to_string();
                Ok(Some(Selection::keep(count, false, syntax)))
            }
            Some(c) if c.eq_ignore_ascii_case(&'d') => {
                self.cursor.advance();
                // `select_high` names which end of the sorted dice the
                // operation targets, same as in the keep branches above:
                // "dh" targets (drops) the highs, "dl" targets the lows.
                let select_high = if self.cursor.eat_char_ci('h') {
                    true
                } else if self.cursor.eat_char_ci('l') {
                    false
                } else {
                    false // bare 'd' ≡ 'dl'
                };
                let count = self.parse_suffix_count();
                let syntax = self.slice(start, self.cursor.position()).to_string();
                Ok(Some(Selection::drop(count, select_high, syntax)))
            }
            Some(c) if c.eq_ignore_ascii_case(&'s') => {
                self.cursor.advance();
                let (op, value) = self.parse_cmp_and_value('s')?;
                let syntax = self.slice(start, self.cursor.position()).to_string();
                Ok(Some(Selection::conditional(op, value, syntax)))
            }
            Some(c) if c.eq_ignore_ascii_case(&'r') => {
                self.cursor.advance();
                let (op, value) = self.parse_cmp_and_value('r')?;
                let syntax = self.slice(start, self.cursor.position()).to_string();
                Ok(Some(Selection::reroll(op, value, syntax)))
            }
            _ => Ok(None),
        }
    }

    /// `count?` in a keep/drop suffix: an optional unsigned number,
    /// defaulting to 1.
    fn parse_suffix_count(&mut self) -> i64 {
        match self.cursor.eat_digits() {
            Some(digits) => digits.parse().unwrap_or(1),
            None => 1,
        }
    }

    /// `cmp-op? signed-number?` for `s`/`r` suffixes: an operator with no
    /// following digits is a parse error; no operator
    /// at all defaults to `=`, and a bare value without an operator also
    /// defaults to `=`.
    fn parse_cmp_and_value(&mut self, suffix: char) -> Result<(Cmp, i64), EngineError> {
        let position = self.cursor.position();
        let op = self.eat_cmp_op();
        match op {
            Some(op) => {
                let value = self.eat_signed_number().ok_or(EngineError::ParseMissingOperator {
                    suffix,
                    position: self.cursor.position(),
                })?;
                Ok((op, value))
            }
            None => {
                let value = self.eat_signed_number().unwrap_or(1);
                let _ = position;
                Ok((Cmp::Eq, value))
            }
        }
    }

    fn eat_cmp_op(&mut self) -> Option<Cmp> {
        let two = self.cursor.rest();
        if two.starts_with(">=") {
            self.cursor.advance();
            self.cursor.advance();
            return Some(Cmp::Gte);
        }
        if two.starts_with("<=") {
            self.cursor.advance();
            self.cursor.advance();
            return Some(Cmp::Lte);
        }
        if two.starts_with("<>") || two.starts_with("!=") {
            self.cursor.advance();
            self.cursor.advance();
            return Some(Cmp::Neq);
        }
        if two.starts_with("==") {
            self.cursor.advance();
            self.cursor.advance();
            return Some(Cmp::Eq);
        }
        match self.cursor.peek() {
            Some('>') => {
                self.cursor.advance();
                Some(Cmp::Gt)
            }
            Some('<') => {
                self.cursor.advance();
                Some(Cmp::Lt)
            }
            Some('=') => {
                self.cursor.advance();
                Some(Cmp::Eq)
            }
            _ => None,
        }
    }

    fn eat_signed_number(&mut self) -> Option<i64> {
        let negative = self.cursor.eat_char('-');
        let digits = self.cursor.eat_digits()?;
        let value: i64 = digits.parse().ok()?;
        Some(if negative { -value } else { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    fn parse_ok(s: &str) -> Ast {
        parse(s, 4096, false).unwrap_or_else(|e| panic!("parse({s:?}) failed: {e}"))
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let ast = parse_ok("2+3*4");
        match ast.get(ast.root) {
            Node::BinaryOp { op: BinOp::Add, right, .. } => match ast.get(*right) {
                Node::BinaryOp { op: BinOp::Mul, .. } => {}
                other => panic!("expected Mul on rhs, got {other:?}"),
            },
            other => panic!("expected top-level Add, got {other:?}"),
        }
    }

    #[test]
    fn parens_override_precedence() {
        let ast = parse_ok("(2+3)*4");
        match ast.get(ast.root) {
            Node::BinaryOp { op: BinOp::Mul, left, .. } => match ast.get(*left) {
                Node::BinaryOp { op: BinOp::Add, .. } => {}
                other => panic!("expected Add on lhs, got {other:?}"),
            },
            other => panic!("expected top-level Mul, got {other:?}"),
        }
    }

    #[test]
    fn basic_dice_has_count_and_sides() {
        let ast = parse_ok("3d6");
        match ast.get(ast.root) {
            Node::DiceOp(op) => {
                assert_eq!(op.kind, DiceKind::Basic);
                assert!(op.count.is_some());
                assert!(op.sides.is_some());
            }
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn implicit_count_defaults_to_one() {
        let ast = parse_ok("d6");
        match ast.get(ast.root) {
            Node::DiceOp(op) => assert!(op.count.is_none()),
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn keep_high_shorthands_normalize() {
        for s in ["4d6k3", "4d6kh3", "4d6h3"] {
            let ast = parse_ok(s);
            match ast.get(ast.root) {
                Node::DiceOp(op) => {
                    let sel = op.selection.as_ref().unwrap();
                    assert_eq!(sel.count, 3);
                    assert!(sel.select_high);
                    assert!(!sel.is_drop_operation);
                }
                other => panic!("{s}: expected DiceOp, got {other:?}"),
            }
        }
    }

    #[test]
    fn drop_low_shorthand_matches_explicit() {
        for s in ["4d6d1", "4d6dl1"] {
            let ast = parse_ok(s);
            match ast.get(ast.root) {
                Node::DiceOp(op) => {
                    let sel = op.selection.as_ref().unwrap();
                    assert_eq!(sel.count, 1);
                    assert!(sel.is_drop_operation);
                    assert!(!sel.select_high); // dl targets the lows
                }
                other => panic!("{s}: expected DiceOp, got {other:?}"),
            }
        }
    }

    #[test]
    fn drop_high_targets_highs() {
        let ast = parse_ok("4d6dh1");
        match ast.get(ast.root) {
            Node::DiceOp(op) => {
                let sel = op.selection.as_ref().unwrap();
                assert!(sel.is_drop_operation);
                assert!(sel.select_high); // dh targets the highs
            }
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn conditional_suffix_defaults() {
        let ast = parse_ok("10d6s");
        match ast.get(ast.root) {
            Node::DiceOp(op) => {
                let sel = op.selection.as_ref().unwrap();
                assert!(sel.is_conditional);
                assert_eq!(sel.comparison_op, Cmp::Eq);
                assert_eq!(sel.comparison_value, 1);
            }
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn conditional_suffix_double_equals_accepted() {
        let ast = parse_ok("10d6s==6");
        match ast.get(ast.root) {
            Node::DiceOp(op) => {
                let sel = op.selection.as_ref().unwrap();
                assert_eq!(sel.comparison_op, Cmp::Eq);
                assert_eq!(sel.comparison_value, 6);
            }
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn reroll_missing_digits_after_operator_is_error() {
        let err = parse("3d6r>", 4096, false).unwrap_err();
        assert!(matches!(err, EngineError::ParseMissingOperator { suffix: 'r', .. }));
    }

    #[test]
    fn inline_fate_die_three_sides() {
        let ast = parse_ok("4d{-1,0,1}");
        match ast.get(ast.root) {
            Node::DiceOp(op) => {
                let die = op.custom_die.as_ref().unwrap();
                assert_eq!(die.side_count(), 3);
                assert_eq!(die.sides[0].value, -1);
            }
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn inline_labeled_die() {
        let ast = parse_ok(r#"1d{0:"Skull",1:"Shield"}"#);
        match ast.get(ast.root) {
            Node::DiceOp(op) => {
                let die = op.custom_die.as_ref().unwrap();
                assert_eq!(die.sides[0].label.as_deref(), Some("Skull"));
                assert_eq!(die.sides[1].value, 1);
            }
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn inline_string_only_die_uses_index_as_value() {
        let ast = parse_ok(r#"1d{"Earth","Wind","Fire"}"#);
        match ast.get(ast.root) {
            Node::DiceOp(op) => {
                let die = op.custom_die.as_ref().unwrap();
                assert_eq!(die.sides[0].value, 0);
                assert_eq!(die.sides[1].value, 1);
                assert_eq!(die.sides[2].value, 2);
                assert_eq!(die.sides[2].label.as_deref(), Some("Fire"));
            }
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn named_custom_die_reference() {
        let ast = parse_ok("4dF");
        match ast.get(ast.root) {
            Node::DiceOp(op) => {
                assert_eq!(op.kind, DiceKind::Custom);
                assert_eq!(op.custom_name.as_deref(), Some("F"));
            }
            other => panic!("expected DiceOp, got {other:?}"),
        }
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse("2+2 garbage", 4096, false).unwrap_err();
        assert!(matches!(err, EngineError::ParseUnexpectedTrailing { .. }));
    }

    #[test]
    fn rejects_empty_and_invalid_and_truncated_inputs() {
        for s in ["", "invalid", "1d", "(("] {
            assert!(parse(s, 4096, false).is_err(), "expected {s:?} to fail to parse");
        }
    }

    #[test]
    fn strict_mode_rejects_implicit_count() {
        assert!(parse("d6", 4096, true).is_err());
        assert!(parse("1d6", 4096, true).is_ok());
    }

    #[test]
    fn strict_mode_allows_space_before_d_rejects_space_after() {
        assert!(parse("3 d6", 4096, true).is_ok());
        assert!(parse("3 d 6", 4096, true).is_err());
    }

    #[test]
    fn whitespace_is_ignored_between_tokens() {
        let a = parse_ok("2 + 3 * 4");
        let b = parse_ok("2+3*4");
        assert_eq!(format!("{:?}", a.get(a.root)), format!("{:?}", b.get(b.root)));
    }
}
