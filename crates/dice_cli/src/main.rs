// crates/dice_cli/src/main.rs
//
// Thin binary consumer of `dice_engine`: construct a context, optionally
// register custom dice and a seed, evaluate an expression, print the
// result. Strictly offline & deterministic: no network, no ambient OS RNG
// unless the user omits `--seed` (in which case the engine derives one
// from the wall clock).

mod args;

use std::process::ExitCode;

use args::{parse_and_validate, parse_seed_u64, Args};
use dice_core::ChaChaDiceRng;
use dice_engine::{Context, Features};

const ARENA_CAPACITY: usize = 4096;

fn main() -> ExitCode {
    let args = match parse_and_validate() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let mut ctx = Context::new(ARENA_CAPACITY, Features::ALL);

    if let Some(seed) = &args.seed {
        let seed = parse_seed_u64(seed).map_err(|e| e.to_string())?;
        ctx.set_rng(Box::new(ChaChaDiceRng::new(seed)));
    }

    for def in &args.dice {
        ctx.parse_and_register_die(def)
            .map_err(|e| format!("--die {def}: {}", e.message()))?;
    }

    for _ in 0..args.count {
        let outcome = ctx.roll_expression(&args.expression);
        if !outcome.success {
            return Err(ctx.get_error().unwrap_or_else(|| "unknown error".to_string()));
        }
        if args.individual {
            print!("{}", ctx.format_trace_string());
        }
        println!("{}", outcome.value);
        ctx.clear_trace();
    }

    Ok(())
}
