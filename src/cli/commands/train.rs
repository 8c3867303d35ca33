//! Train command - Learn a value table on the scripted track

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::warn;

use crate::{
    app::App,
    cli::{
        config::{AgentArgs, TrackArgs},
        output::{format_number, print_kv, print_result, print_section, print_subsection},
    },
    pipeline::{
        JsonlObserver, MetricsObserver, ProgressObserver, ScriptedTrack, SharedObserver,
        TrainingConfig, TrainingPipeline,
    },
    sensors::Action,
};

#[derive(Parser, Debug)]
#[command(about = "Train an agent on the scripted track", allow_negative_numbers = true)]
pub struct TrainArgs {
    #[command(flatten)]
    pub agent: AgentArgs,

    #[command(flatten)]
    pub track: TrackArgs,

    /// Number of training episodes
    #[arg(long, short = 'e', default_value_t = 200)]
    pub episodes: u64,

    /// Where the trained table is written
    #[arg(long, short = 't', default_value = "qtable.msgpack")]
    pub table: PathBuf,

    /// Continue from the table already at --table, if there is one
    #[arg(long)]
    pub resume: bool,

    /// Index of the first episode (drives the exploration schedule)
    #[arg(long, default_value_t = 0)]
    pub first_episode: u64,

    /// Write the training summary as JSON
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Write one JSON line per episode
    #[arg(long)]
    pub log_episodes: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let mut config = args.agent.resolve()?;
    if args.resume {
        if args.table.exists() {
            config.table_path = Some(args.table.clone());
        } else {
            warn!(path = %args.table.display(), "no table to resume from, starting fresh");
        }
    }

    let app = App::new();
    let mut agent = app
        .create_agent("trainer", config.clone())
        .context("failed to create agent")?;
    let track_config = args.track.resolve();
    let mut track = ScriptedTrack::new(track_config).context("invalid track configuration")?;

    print_section("Training");
    print_kv("Policy", config.policy.name());
    print_kv("Alpha / gamma", &format!("{} / {}", config.learning_rate, config.discount));
    print_kv("Episodes", &format_number(args.episodes));
    print_kv("Episode length", &format_number(track_config.episode_length));
    print_kv(
        "Starting from",
        &config
            .table_path
            .as_ref()
            .map_or_else(|| "fresh table".to_string(), |p| p.display().to_string()),
    );
    if let Some(seed) = config.seed {
        print_kv("Seed", &seed.to_string());
    }

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        episodes: args.episodes,
        first_episode: args.first_episode,
        learn: true,
    });
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.log_episodes {
        pipeline = pipeline.with_observer(Box::new(JsonlObserver::new(path)?));
    }
    let (metrics, metrics_handle) = SharedObserver::new(MetricsObserver::new());
    pipeline = pipeline.with_observer(Box::new(metrics));

    let result = pipeline.run(&mut agent, &mut track)?;

    print_subsection("Results");
    print_result(&result);
    print_kv(
        "Visited states",
        &format!(
            "{} / {}",
            agent.table().visited_states(),
            agent.table().space().len()
        ),
    );

    let metrics = metrics_handle
        .lock()
        .map_err(|_| anyhow!("metrics observer lock poisoned"))?;
    print_kv(
        "Last 20 episodes",
        &format!("{:.2}", metrics.recent_mean_reward(20)),
    );
    print_subsection("Action distribution");
    let total: u64 = metrics.action_counts().iter().sum();
    for (action, count) in Action::ALL.iter().zip(metrics.action_counts()) {
        let share = if total > 0 {
            *count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        print_kv(&action.to_string(), &format!("{share:.1}%"));
    }

    app.save_agent(&agent, &args.table)
        .with_context(|| format!("failed to save table to {}", args.table.display()))?;
    println!("\n✓ Table saved to: {}", args.table.display());

    if let Some(path) = &args.summary {
        result
            .save(path)
            .with_context(|| format!("failed to write summary {}", path.display()))?;
        println!("✓ Summary saved to: {}", path.display());
    }

    Ok(())
}
