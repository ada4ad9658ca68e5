// Arbor sequencer CLI entry point.
//
// Drives the engine through a number of passes on a fixed internal clock
// and prints each walked path with its output voltage, then the reach
// probabilities the live weights imply and a JSON snapshot of the
// resumable state.
//
// Usage:
//   cargo run -p arbor_seq --bin simulate -- [--passes N] [--seed N]
//     [--ext-seed V] [--scale NAME] [--key N] [--quantize] [--randomize]
//     [--restore state.json]
//
// Scales: chromatic, major, minor, melodic-minor, harmonic-minor,
// pentatonic-major, pentatonic-minor, whole-tone, blues, dorian,
// phrygian, mixolydian

use arbor_seq::edit;
use arbor_seq::engine::{Engine, SavedState, TickInputs};
use arbor_seq::graph::{ROW_START, ROWS};
use arbor_seq::quantizer::Scale;
use std::path::Path;

// Clock period for the simulated ticks, seconds.
const TICK: f32 = 0.125;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let passes: usize = parse_flag(&args, "--passes").unwrap_or(4);
    let seed: u64 = parse_flag(&args, "--seed").unwrap_or(0);
    let ext_seed: Option<f32> = parse_flag(&args, "--ext-seed");
    let key: usize = parse_flag(&args, "--key").unwrap_or(0);
    let scale_name: String = parse_flag(&args, "--scale").unwrap_or_else(|| "minor".to_string());
    let quantize = has_flag(&args, "--quantize");
    let randomize = has_flag(&args, "--randomize");

    let scale = parse_scale(&scale_name);

    println!("=== Arbor Sequencer ===");
    println!("Passes: {passes}");
    println!("Master seed: {seed}");
    if let Some(v) = ext_seed {
        println!("External seed: {v}");
    }
    if quantize {
        println!("Quantize: {} / key {key}", scale.name());
    }
    println!();

    let mut engine = Engine::new(seed);
    engine.config.quantize = quantize;
    engine.config.scale = scale;
    engine.config.key = key % 12;

    if randomize {
        let values = edit::randomize_values(&mut engine);
        let weights = edit::randomize_weights(&mut engine);
        println!(
            "Randomized {} node values and {} edge weights.",
            values.after.len(),
            weights.after.len()
        );
        println!();
    }

    if let Some(path) = parse_flag::<String>(&args, "--restore") {
        match load_state(Path::new(&path)) {
            Ok(state) => {
                engine.restore(&state);
                println!(
                    "Resumed from {path}: step {}, node {}.",
                    engine.step(),
                    engine.node()
                );
                println!();
            }
            Err(e) => println!("Could not restore {path}: {e}. Starting fresh."),
        }
    }

    let (_, step_last) = engine.step_range();
    for pass in 1..=passes {
        // One pass is step_last triggers: the last one wraps the walk
        // back to the root.
        let mut nodes = Vec::new();
        let mut volts = Vec::new();
        for _ in 0..step_last {
            engine.tick(&TickInputs {
                dt: TICK,
                forward: true,
                seed: ext_seed,
                ..TickInputs::default()
            });
            nodes.push(engine.node());
            volts.push(engine.output());
        }
        let path = nodes
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" > ");
        let cv = volts
            .iter()
            .map(|v| format!("{v:+.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("pass {pass}: {path}");
        println!("         {cv} V");
    }

    println!();
    println!("Reach probabilities:");
    let probs = engine.probabilities();
    for row in 0..ROWS {
        let line = (ROW_START[row]..ROW_START[row + 1])
            .map(|n| format!("{:.3}", probs[n]))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  row {row}: {line}");
    }

    println!();
    match serde_json::to_string(&engine.save()) {
        Ok(json) => println!("Resumable state: {json}"),
        Err(e) => println!("Could not encode state: {e}"),
    }
}

/// Load a persisted engine snapshot from a JSON file.
fn load_state(path: &Path) -> Result<SavedState, Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    let state: SavedState = serde_json::from_str(&data)?;
    Ok(state)
}

/// Parse `--flag value` pairs; returns None when absent or unparsable.
fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_scale(name: &str) -> Scale {
    Scale::ALL
        .into_iter()
        .find(|s| s.name() == name)
        .unwrap_or_else(|| {
            println!("Unknown scale '{name}', using minor.");
            Scale::NaturalMinor
        })
}
