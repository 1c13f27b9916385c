//! Neurotransmitter Simulation CLI Tool
//!
//! Inspect a patient's neurotransmitter mapping and run cascade simulations
//! against it. Without `--mapping` the literature default mapping is used.
//!
//! Usage:
//!   nt-simulate simulate --change serotonin=0.3 [--change dopamine=-0.2] [--steps <n>] [--trace]
//!   nt-simulate effects <neurotransmitter> <change>
//!   nt-simulate region <region>
//!   nt-simulate response <region> <neurotransmitter> <level>
//!   nt-simulate export

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use neurotransmitter_core::*;
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "nt-simulate")]
#[command(author = "Mycelix Health")]
#[command(version = "0.1.0")]
#[command(about = "Simulate neurotransmitter cascades on a mental-health digital twin", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Mapping JSON file (default mapping if not specified)
    #[arg(short, long, global = true)]
    mapping: Option<PathBuf>,

    /// Patient id for the default mapping
    #[arg(short, long, global = true)]
    patient: Option<Uuid>,

    /// Cascade configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a cascade simulation
    Simulate {
        /// Level change as <neurotransmitter>=<delta>, repeatable
        #[arg(long = "change", value_parser = parse_change, required = true)]
        changes: Vec<(Neurotransmitter, f64)>,

        /// Number of steps including the direct pass
        #[arg(short, long)]
        steps: Option<usize>,

        /// Include per-step snapshots
        #[arg(long)]
        trace: bool,
    },

    /// One-hop effects of a neurotransmitter level change
    Effects {
        neurotransmitter: Neurotransmitter,

        /// Change from the 0.5 baseline
        #[arg(allow_negative_numbers = true)]
        change: f64,
    },

    /// Receptor summary for a brain region
    Region { region: BrainRegion },

    /// Response of one region to one neurotransmitter level
    Response {
        region: BrainRegion,
        neurotransmitter: Neurotransmitter,
        level: f64,
    },

    /// Print the mapping as JSON
    Export,
}

fn parse_change(input: &str) -> std::result::Result<(Neurotransmitter, f64), String> {
    let (name, delta) = input
        .split_once('=')
        .ok_or_else(|| format!("expected <neurotransmitter>=<delta>, got '{input}'"))?;
    let neurotransmitter = name.trim().parse::<Neurotransmitter>().map_err(|e| e.to_string())?;
    let delta = delta
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid delta '{delta}': {e}"))?;
    Ok((neurotransmitter, delta))
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_mapping(path: Option<&PathBuf>, patient: Option<Uuid>) -> Result<NeurotransmitterMapping> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading mapping {}", path.display()))?;
            let mapping = NeurotransmitterMapping::from_json(&content)
                .with_context(|| format!("parsing mapping {}", path.display()))?;
            if let Some(patient) = patient {
                if patient != mapping.patient_id() {
                    bail!(
                        "mapping belongs to patient {}, not {}",
                        mapping.patient_id(),
                        patient
                    );
                }
            }
            tracing::info!(path = %path.display(), profiles = mapping.profile_count(), "Mapping loaded");
            Ok(mapping)
        }
        None => Ok(create_default_neurotransmitter_mapping(
            patient.unwrap_or_else(Uuid::new_v4),
        )),
    }
}

fn activations_json(regions: &BTreeMap<BrainRegion, RegionActivation>) -> serde_json::Value {
    regions
        .iter()
        .map(|(region, a)| {
            (
                region.to_string(),
                json!({
                    "activation": a.activation,
                    "confidence": a.confidence,
                    "clinical_significance": a.clinical_significance(),
                }),
            )
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => CascadeConfig::from_json_file(path)?,
        None => CascadeConfig::default(),
    };
    let mapping = load_mapping(cli.mapping.as_ref(), cli.patient)?;

    let result: serde_json::Value = match cli.command {
        Commands::Simulate { changes, steps, trace } => {
            let changes: BTreeMap<_, _> = changes.into_iter().collect();
            let steps = steps.unwrap_or(config.default_steps);

            if trace {
                let trace = mapping.simulate_cascade_traced(&changes, steps, &config)?;
                let snapshots: Vec<_> = trace
                    .steps
                    .iter()
                    .map(|s| json!({ "step": s.step, "regions": activations_json(&s.regions) }))
                    .collect();
                json!({
                    "patient_id": mapping.patient_id(),
                    "steps": steps,
                    "trace": snapshots,
                    "result": activations_json(&trace.result),
                })
            } else {
                let result = mapping.simulate_cascade_with(&changes, steps, &config)?;
                json!({
                    "patient_id": mapping.patient_id(),
                    "steps": steps,
                    "result": activations_json(&result),
                })
            }
        }
        Commands::Effects { neurotransmitter, change } => {
            let effects = mapping.get_neurotransmitter_effects(neurotransmitter, change);
            json!({
                "neurotransmitter": neurotransmitter,
                "change": change,
                "effects": effects,
            })
        }
        Commands::Region { region } => {
            let profile = mapping.get_brain_region_neurotransmitter_profile(region);
            json!({
                "region": region,
                "neurotransmitters": profile,
                "producing": Neurotransmitter::ALL
                    .iter()
                    .filter(|nt| mapping.get_producing_regions(**nt).contains(&region))
                    .collect::<Vec<_>>(),
            })
        }
        Commands::Response { region, neurotransmitter, level } => {
            let (response, confidence) =
                mapping.calculate_region_response(region, neurotransmitter, level);
            json!({
                "region": region,
                "neurotransmitter": neurotransmitter,
                "level": level,
                "response": response,
                "confidence": confidence,
                "sensitivity": mapping.calculate_region_sensitivity(region, neurotransmitter),
            })
        }
        Commands::Export => serde_json::to_value(&mapping)?,
    };

    let output_str = serde_json::to_string_pretty(&result)?;
    if let Some(output_path) = cli.output {
        fs::write(&output_path, &output_str)
            .with_context(|| format!("writing {}", output_path.display()))?;
        eprintln!("Output written to: {}", output_path.display());
    } else {
        println!("{}", output_str);
    }

    Ok(())
}
