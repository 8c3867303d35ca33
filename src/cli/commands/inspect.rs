//! Inspect command - Summarize a saved value table

use std::{cmp::Ordering, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    adapters::MsgPackRepository,
    cli::output::{format_number, print_kv, print_section, print_subsection},
    discretizer::{Discretizer, RaceDiscretizer},
    ports::TableRepository,
    sensors::Action,
    value_table::ValueTable,
};

#[derive(Parser, Debug)]
#[command(about = "Inspect a saved value table")]
pub struct InspectArgs {
    /// Path to the table
    pub table: PathBuf,

    /// Number of highest-valued states to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct GreedyEntry {
    state: String,
    action: String,
    value: f64,
}

#[derive(Debug, Serialize)]
struct TableReport {
    levels: Vec<usize>,
    states: usize,
    actions: usize,
    initial_value: f64,
    visited_states: usize,
    matches_race_discretizer: bool,
    /// Number of states whose greedy choice is each action
    greedy_actions: Vec<(String, usize)>,
    best_states: Vec<GreedyEntry>,
}

fn action_label(index: usize) -> String {
    Action::from_index(index).map_or_else(|_| format!("#{index}"), |a| a.to_string())
}

fn report(table: &ValueTable, top: usize) -> crate::Result<TableReport> {
    let mut greedy_counts = vec![0; table.num_actions()];
    let mut entries = Vec::new();

    for (state, row) in table.iter() {
        if row.iter().all(|&v| v == table.initial_value()) {
            continue;
        }
        let (action, value) = table.best_action(&state)?;
        greedy_counts[action] += 1;
        entries.push(GreedyEntry {
            state: state.to_string(),
            action: action_label(action),
            value,
        });
    }
    entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    entries.truncate(top);

    Ok(TableReport {
        levels: table.levels().to_vec(),
        states: table.space().len(),
        actions: table.num_actions(),
        initial_value: table.initial_value(),
        visited_states: table.visited_states(),
        matches_race_discretizer: table.levels()
            == RaceDiscretizer::default().discretization_levels().as_slice(),
        greedy_actions: greedy_counts
            .into_iter()
            .enumerate()
            .map(|(a, n)| (action_label(a), n))
            .collect(),
        best_states: entries,
    })
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let table = MsgPackRepository::new()
        .load(&args.table)
        .with_context(|| format!("failed to load table {}", args.table.display()))?;
    let report = report(&table, args.top)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section(&format!("Table {}", args.table.display()));
    print_kv("Levels", &format!("{:?}", report.levels));
    print_kv("States", &format_number(report.states as u64));
    print_kv("Actions", &report.actions.to_string());
    print_kv("Initial value", &report.initial_value.to_string());
    print_kv(
        "Visited states",
        &format_number(report.visited_states as u64),
    );
    print_kv(
        "Race discretizer",
        if report.matches_race_discretizer {
            "compatible"
        } else {
            "different levels"
        },
    );

    print_subsection("Greedy action over visited states");
    for (action, count) in &report.greedy_actions {
        print_kv(action, &format_number(*count as u64));
    }

    print_subsection(&format!("Top {} states", report.best_states.len()));
    for entry in &report.best_states {
        println!("  {:24} {:12} {:>10.3}", entry.state, entry.action, entry.value);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_space::StateSpace;

    #[test]
    fn test_report_lists_visited_states_by_value() {
        let mut table = ValueTable::new(StateSpace::new(vec![2, 3]).unwrap(), 5, 0.0).unwrap();
        table.set(&[0, 1].into(), 2, 5.0).unwrap();
        table.set(&[1, 2].into(), 0, 9.0).unwrap();
        table.set(&[1, 0].into(), 4, -3.0).unwrap();

        let report = report(&table, 2).unwrap();

        assert_eq!(report.states, 6);
        assert_eq!(report.visited_states, 3);
        assert!(!report.matches_race_discretizer);
        assert_eq!(
            report.best_states,
            vec![
                GreedyEntry {
                    state: "(1, 2)".to_string(),
                    action: "right".to_string(),
                    value: 9.0,
                },
                GreedyEntry {
                    state: "(0, 1)".to_string(),
                    action: "accelerate".to_string(),
                    value: 5.0,
                },
            ]
        );
        // The all-negative row still prefers an untouched action.
        assert_eq!(report.greedy_actions[0], ("right".to_string(), 2));
        assert_eq!(report.greedy_actions[2], ("accelerate".to_string(), 1));
    }
}
