// crates/dice_cli/src/args.rs
//
// Deterministic, offline CLI argument parsing & validation.
// - Exactly one positional expression.
// - `--die NAME=DEF` is repeatable and validated eagerly so a typo in a
//   die definition fails before any roll happens.
// - `--seed` accepts decimal or 0x-hex, same convention as the engine's
//   "seed of zero derives from the wall clock" rule.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "dice", version, about = "Evaluate a dice expression.")]
pub struct Args {
    /// The dice expression to evaluate, e.g. "3d6+2" or "4d6kh3".
    pub expression: String,

    /// Seed the RNG (decimal or 0x-prefixed hex). Zero derives a seed from
    /// the wall clock.
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Repeat the roll this many times.
    #[arg(short, long, default_value_t = 1)]
    pub count: u32,

    /// Print the per-die trace before the total.
    #[arg(short, long)]
    pub individual: bool,

    /// Register a named custom die as `NAME=<inline-literal>`, e.g.
    /// `F={-1,0,1}`. May be repeated.
    #[arg(long = "die", value_name = "NAME=DEF")]
    pub dice: Vec<String>,
}

#[derive(Debug)]
pub enum CliError {
    BadSeed(String),
    BadCount,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::BadSeed(s) => write!(f, "invalid seed: {s}"),
            CliError::BadCount => write!(f, "--count must be at least 1"),
        }
    }
}

impl std::error::Error for CliError {}

/// Entry point used by main.rs; clap itself handles `-h`/`-v` and missing
/// the required positional, so this only covers what clap can't validate.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    if args.count == 0 {
        return Err(CliError::BadCount);
    }
    if let Some(s) = &args.seed {
        parse_seed_u64(s)?;
    }
    Ok(args)
}

/// Parse a seed as u64: decimal or 0x-hex (1..=16 nybbles).
pub fn parse_seed_u64(s: &str) -> Result<u64, CliError> {
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CliError::BadSeed(s.to_string()));
        }
        u64::from_str_radix(rest, 16).map_err(|_| CliError::BadSeed(s.to_string()))
    } else {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(CliError::BadSeed(s.to_string()));
        }
        s.parse::<u64>().map_err(|_| CliError::BadSeed(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_decimal_ok() {
        assert_eq!(parse_seed_u64("12345").unwrap(), 12_345u64);
    }

    #[test]
    fn seed_hex_ok() {
        assert_eq!(parse_seed_u64("0xDEADBEEFCAFE1234").unwrap(), 0xDEADBEEFCAFE1234u64);
    }

    #[test]
    fn seed_bad() {
        assert!(parse_seed_u64("0x").is_err());
        assert!(parse_seed_u64("0xZZ").is_err());
        assert!(parse_seed_u64("-1").is_err());
        assert!(parse_seed_u64("").is_err());
        assert!(parse_seed_u64("0x1234567890ABCDEF12").is_err()); // >16 nybbles
    }

    #[test]
    fn zero_seed_is_a_valid_decimal() {
        assert_eq!(parse_seed_u64("0").unwrap(), 0u64);
    }
}
