//! Numeric safety limits enforced during evaluation.
//!
//! Plain data + `Default` rather than a builder type.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policy {
    pub max_dice_count: i64,
    pub max_sides: i64,
    pub max_explosion_depth: u32,
    pub allow_negative_dice: bool,
    pub strict_mode: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            max_dice_count: 1000,
            max_sides: 1_000_000,
            max_explosion_depth: 10,
            allow_negative_dice: false,
            strict_mode: false,
        }
    }
}

impl Policy {
    /// Cheap sanity check for hand-built policies.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_dice_count < 1 {
            return Err("max_dice_count must be >= 1");
        }
        if self.max_sides < 1 {
            return Err("max_sides must be >= 1");
        }
        Ok(())
    }
}

/// The reroll safety cap — a hard constant rather than a policy knob.
pub const REROLL_LIMIT: u32 = 100;
