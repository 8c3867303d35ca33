//! Evaluate command - Run a trained table without updating it

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use crate::{
    app::App,
    cli::{
        config::{AgentArgs, TrackArgs},
        output::{print_kv, print_result, print_section, print_subsection},
    },
    pipeline::{
        MetricsObserver, ProgressObserver, ScriptedTrack, SharedObserver, TrainingConfig,
        TrainingPipeline,
    },
    policy::PolicyConfig,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a trained table", allow_negative_numbers = true)]
pub struct EvaluateArgs {
    /// Path to the trained table
    pub table: PathBuf,

    #[command(flatten)]
    pub agent: AgentArgs,

    #[command(flatten)]
    pub track: TrackArgs,

    /// Number of evaluation episodes
    #[arg(long, short = 'e', default_value_t = 20)]
    pub episodes: u64,

    /// Keep the configured exploration policy instead of acting greedily
    #[arg(long)]
    pub explore: bool,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,

    /// Export results to file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Epsilon-greedy schedule that always exploits.
pub(crate) fn greedy() -> PolicyConfig {
    PolicyConfig::EpsilonGreedy {
        initial: 1.0,
        decay: 0.99,
        ceiling: 1.0,
    }
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    let mut config = args.agent.resolve()?.with_table_path(&args.table);
    if !args.explore {
        config.policy = greedy();
    }

    println!("Loading trained table from: {}", args.table.display());
    let app = App::new();
    let mut agent = app
        .create_agent("evaluator", config.clone())
        .with_context(|| format!("failed to load table {}", args.table.display()))?;
    let mut track =
        ScriptedTrack::new(args.track.resolve()).context("invalid track configuration")?;

    print_section("Evaluation");
    print_kv(
        "Policy",
        if args.explore {
            config.policy.name()
        } else {
            "greedy"
        },
    );
    print_kv("Episodes", &args.episodes.to_string());

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        episodes: args.episodes,
        first_episode: 0,
        learn: false,
    });
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    let (metrics, metrics_handle) = SharedObserver::new(MetricsObserver::new());
    pipeline = pipeline.with_observer(Box::new(metrics));

    let result = pipeline.run(&mut agent, &mut track)?;

    print_subsection("Per-episode reward");
    let metrics = metrics_handle
        .lock()
        .map_err(|_| anyhow!("metrics observer lock poisoned"))?;
    for (episode, reward) in metrics.rewards().iter().enumerate() {
        print_kv(&format!("Episode {episode}"), &format!("{reward:.1}"));
    }

    print_subsection("Totals");
    print_result(&result);

    if let Some(path) = &args.export {
        result
            .save(path)
            .with_context(|| format!("failed to export results to {}", path.display()))?;
        println!("\n✓ Results exported to: {}", path.display());
    }

    Ok(())
}
