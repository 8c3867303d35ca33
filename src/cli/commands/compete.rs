//! Compete command - Race two trained tables against each other

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::App,
    cli::{
        commands::evaluate::greedy,
        config::AgentArgs,
        output::{print_kv, print_section, print_subsection},
    },
    pipeline::{Competition, CompetitionConfig, POINTS_PER_WIN, TrackConfig},
};

#[derive(Parser, Debug)]
#[command(about = "Race two trained tables", allow_negative_numbers = true)]
pub struct CompeteArgs {
    /// Table of the first car
    pub first: PathBuf,

    /// Table of the second car
    pub second: PathBuf,

    #[command(flatten)]
    pub agent: AgentArgs,

    /// Seeds of the tracks to race on
    #[arg(long, value_delimiter = ',', default_values_t = [0, 1, 2])]
    pub tracks: Vec<u64>,

    /// Ticks per race
    #[arg(long, default_value_t = 400)]
    pub episode_length: u64,

    /// Race every track once instead of once from each lane
    #[arg(long)]
    pub no_swap: bool,

    /// Export results to file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

fn car_name(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

pub fn execute(args: CompeteArgs) -> Result<()> {
    let mut config = args.agent.resolve()?;
    config.policy = greedy();

    let mut names = [car_name(&args.first, "first"), car_name(&args.second, "second")];
    if names[0] == names[1] {
        names[0].push_str("-1");
        names[1].push_str("-2");
    }

    let app = App::new();
    let mut first = app
        .create_agent(&names[0], config.clone().with_table_path(&args.first))
        .with_context(|| format!("failed to load table {}", args.first.display()))?;
    let mut second = app
        .create_agent(&names[1], config.with_table_path(&args.second))
        .with_context(|| format!("failed to load table {}", args.second.display()))?;

    let competition = Competition::new(CompetitionConfig {
        tracks: args.tracks.clone(),
        track: TrackConfig {
            episode_length: args.episode_length,
            ..TrackConfig::default()
        },
        swap_sides: !args.no_swap,
    })
    .context("invalid competition configuration")?;

    print_section("Competition");
    print_kv("First", &names[0]);
    print_kv("Second", &names[1]);
    print_kv("Tracks", &args.tracks.len().to_string());

    let result = competition.run(&mut first, &mut second)?;

    print_subsection("Races");
    let mut points = [0; 2];
    for race in &result.races {
        let verdict = match race.winner {
            Some(seat) => {
                points[seat] += POINTS_PER_WIN;
                format!("{} wins", result.names[seat])
            }
            None => "tie".to_string(),
        };
        let lanes = if race.swapped { "swapped" } else { "initial" };
        println!(
            "  track {:>3} ({lanes:7}) | {} cp {:>8.1} vs {} cp {:>8.1} | {verdict:<20} | {}-{}",
            race.track,
            race.scores[0].checkpoints,
            race.scores[0].reward,
            race.scores[1].checkpoints,
            race.scores[1].reward,
            points[0],
            points[1],
        );
    }

    print_subsection("Points");
    print_kv(&result.names[0], &result.points[0].to_string());
    print_kv(&result.names[1], &result.points[1].to_string());
    match result.winner() {
        Some(seat) => println!("\n{} wins the competition", result.names[seat]),
        None => println!("\nThe competition is a tie"),
    }

    if let Some(path) = &args.export {
        result
            .save(path)
            .with_context(|| format!("failed to export results to {}", path.display()))?;
        println!("\n✓ Results exported to: {}", path.display());
    }

    Ok(())
}
