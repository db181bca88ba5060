//! Filter descriptor shared between `dice_parser` (which produces it) and
//! `dice_engine` (which interprets it). `FilterMode` lives here as the
//! `mode()` accessor rather than as a separate enum, since the parser
//! also needs the raw count/op/value fields to build `original_syntax`.

use crate::Value;

/// Comparison operators accepted by `s`/`r` suffixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cmp {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
}

impl Cmp {
    pub fn matches(self, lhs: Value, rhs: Value) -> bool {
        match self {
            Cmp::Gt => lhs > rhs,
            Cmp::Lt => lhs < rhs,
            Cmp::Gte => lhs >= rhs,
            Cmp::Lte => lhs <= rhs,
            Cmp::Eq => lhs == rhs,
            Cmp::Neq => lhs != rhs,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cmp::Gt => ">",
            Cmp::Lt => "<",
            Cmp::Gte => ">=",
            Cmp::Lte => "<=",
            Cmp::Eq => "=",
            Cmp::Neq => "<>",
        }
    }
}

/// A normalized view over a [`Selection`]'s raw fields. Exactly one of
/// these is active for any given `Selection`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    KeepHigh(i64),
    KeepLow(i64),
    DropHigh(i64),
    DropLow(i64),
    Select(Cmp, Value),
    Reroll(Cmp, Value),
}

/// Parsed filter suffix attached to a `Filter`-kind dice op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub count: i64,
    pub select_high: bool,
    pub is_drop_operation: bool,
    pub is_conditional: bool,
    pub is_reroll: bool,
    pub comparison_op: Cmp,
    pub comparison_value: Value,
    pub original_syntax: String,
}

impl Selection {
    pub fn keep(count: i64, select_high: bool, original_syntax: impl Into<String>) -> Self {
        Selection {
            count,
            select_high,
            is_drop_operation: false,
            is_conditional: false,
            is_reroll: false,
            comparison_op: Cmp::Eq,
            comparison_value: 0,
            original_syntax: original_syntax.into(),
        }
    }

    pub fn drop(count: i64, select_high: bool, original_syntax: impl Into<String>) -> Self {
        Selection {
            count,
            select_high,
            is_drop_operation: true,
            is_conditional: false,
            is_reroll: false,
            comparison_op: Cmp::Eq,
            comparison_value: 0,
            original_syntax: original_syntax.into(),
        }
    }

    pub fn conditional(op: Cmp, value: Value, original_syntax: impl Into<String>) -> Self {
        Selection {
            count: 0,
            select_high: true,
            is_drop_operation: false,
            is_conditional: true,
            is_reroll: false,
            comparison_op: op,
            comparison_value: value,
            original_syntax: original_syntax.into(),
        }
    }

    pub fn reroll(op: Cmp, value: Value, original_syntax: impl Into<String>) -> Self {
        Selection {
            count: 0,
            select_high: true,
            is_drop_operation: false,
            is_conditional: false,
            is_reroll: true,
            comparison_op: op,
            comparison_value: value,
            original_syntax: original_syntax.into(),
        }
    }

    pub fn mode(&self) -> FilterMode {
        if self.is_reroll {
            FilterMode::Reroll(self.comparison_op, self.comparison_value)
        } else if self.is_conditional {
            FilterMode::Select(self.comparison_op, self.comparison_value)
        } else if self.is_drop_operation {
            if self.select_high {
                FilterMode::DropHigh(self.count)
            } else {
                FilterMode::DropLow(self.count)
            }
        } else if self.select_high {
            FilterMode::KeepHigh(self.count)
        } else {
            FilterMode::KeepLow(self.count)
        }
    }
}
