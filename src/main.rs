use clap::Parser;
use serde::Serialize;

use libdice::{DiceEngine, GravityProfile, ResolvedBy, RollEffects, RollOutcome, RollState, STEP_DT};

/// CLI for the physics-driven dice roller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of dice to roll
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=6))]
    count: u32,

    /// Gravity profile
    #[arg(short, long, default_value = "normal", value_parser = ["normal", "floaty", "super-floaty", "moon"])]
    gravity: String,

    /// Output format: text, json, csv
    #[arg(short, long, default_value = "text", value_parser = ["text", "json", "csv"])]
    output: String,

    /// Number of rolls for batch mode
    #[arg(long, default_value_t = 1)]
    batch: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Hard cap on simulated frames per roll
    #[arg(long, default_value_t = 1200)]
    max_frames: u32,
}

#[derive(Debug, Clone, Serialize)]
struct RollReport {
    faces: Vec<u32>,
    total: u32,
    resolved_by: String,
    elapsed_ms: u64,
}

impl RollReport {
    fn from_outcome(outcome: &RollOutcome, elapsed_ms: f64) -> RollReport {
        RollReport {
            faces: outcome.faces.clone(),
            total: outcome.total,
            resolved_by: match outcome.resolved_by {
                ResolvedBy::Settled => "settled".to_string(),
                ResolvedBy::Failsafe => "failsafe".to_string(),
            },
            elapsed_ms: elapsed_ms.round() as u64,
        }
    }
}

/// Stand-in for the audio service: logs the cue names instead of playing
/// assets. A real backend's playback failures stay on its side of the trait.
struct ConsoleEffects;

impl RollEffects for ConsoleEffects {
    fn on_roll_start(&mut self) {
        tracing::debug!("audio cue: spin start");
    }

    fn on_roll_resolved(&mut self, outcome: &RollOutcome) {
        tracing::debug!(total = outcome.total, "audio cue: result reveal");
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Drive one roll to resolution: one engine tick per simulated frame.
fn run_roll(
    engine: &mut DiceEngine,
    count: u32,
    profile: GravityProfile,
    max_frames: u32,
) -> Result<RollReport, Box<dyn std::error::Error>> {
    engine.roll(count, profile);
    let started = engine.session().map(|s| s.started_at_ms).unwrap_or(0.0);

    let mut frames = 0;
    while engine.state() == RollState::Rolling {
        if frames >= max_frames {
            return Err("roll did not resolve within the frame cap".into());
        }
        engine.tick(STEP_DT);
        frames += 1;
    }

    let elapsed = engine.now_ms() - started;
    let outcome = engine
        .last_outcome()
        .ok_or("engine resolved without an outcome")?;
    Ok(RollReport::from_outcome(outcome, elapsed))
}

fn run_batch(args: &Args) -> Result<Vec<RollReport>, Box<dyn std::error::Error>> {
    let count = libdice::validate_count(args.count)?;
    let profile = GravityProfile::from_name(&args.gravity);

    let mut engine = DiceEngine::with_effects(Box::new(ConsoleEffects));
    let mut reports = Vec::with_capacity(args.batch);
    for _ in 0..args.batch {
        reports.push(run_roll(&mut engine, count, profile, args.max_frames)?);
    }
    Ok(reports)
}

fn format_output(
    reports: &[RollReport],
    output_format: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    match output_format {
        "text" => {
            let mut output = String::new();
            for (i, report) in reports.iter().enumerate() {
                if reports.len() > 1 {
                    output.push_str(&format!("Roll {}: ", i + 1));
                }
                let faces: Vec<String> = report.faces.iter().map(|f| f.to_string()).collect();
                output.push_str(&format!("{}\n", faces.join(" + ")));
                output.push_str(&format!("Total: {}\n", report.total));
            }
            Ok(output)
        }
        "json" => {
            if reports.len() == 1 {
                Ok(serde_json::to_string_pretty(&reports[0])?)
            } else {
                Ok(serde_json::to_string_pretty(&reports)?)
            }
        }
        "csv" => {
            let mut output = String::from("Roll,Die,Value\n");
            for (i, report) in reports.iter().enumerate() {
                for (d, face) in report.faces.iter().enumerate() {
                    output.push_str(&format!("{},{},{}\n", i + 1, d + 1, face));
                }
            }
            Ok(output)
        }
        _ => Err("Invalid output format".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run_batch(&args) {
        Ok(reports) => {
            let output = format_output(&reports, &args.output)?;
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error during simulation: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reports() -> Vec<RollReport> {
        vec![RollReport {
            faces: vec![4, 6],
            total: 10,
            resolved_by: "settled".to_string(),
            elapsed_ms: 740,
        }]
    }

    #[test]
    fn test_format_output_text() {
        let output = format_output(&sample_reports(), "text").unwrap();
        assert!(output.contains("4 + 6"));
        assert!(output.contains("Total: 10"));
    }

    #[test]
    fn test_format_output_json() {
        let output = format_output(&sample_reports(), "json").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["total"], 10);
        assert_eq!(parsed["resolved_by"], "settled");
        assert_eq!(parsed["faces"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_format_output_csv() {
        let output = format_output(&sample_reports(), "csv").unwrap();
        assert!(output.contains("Roll,Die,Value"));
        assert!(output.contains("1,1,4"));
        assert!(output.contains("1,2,6"));
    }

    #[test]
    fn test_format_output_invalid_format() {
        assert!(format_output(&sample_reports(), "invalid").is_err());
    }

    #[test]
    fn test_run_roll_resolves() {
        let mut engine = DiceEngine::new();
        let report = run_roll(&mut engine, 2, GravityProfile::Normal, 1200).unwrap();
        assert_eq!(report.faces.len(), 2);
        assert!(report.total >= 2 && report.total <= 12);
        assert!(report.elapsed_ms <= 2500 + 40);
    }

    #[test]
    fn test_run_batch_reuses_engine() {
        let args = Args {
            count: 1,
            gravity: "normal".to_string(),
            output: "text".to_string(),
            batch: 2,
            verbose: false,
            max_frames: 1200,
        };
        let reports = run_batch(&args).unwrap();
        assert_eq!(reports.len(), 2);
        for report in reports {
            assert!(report.total >= 1 && report.total <= 6);
        }
    }
}
