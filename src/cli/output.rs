//! Output formatting helpers for the CLI

use crate::pipeline::TrainingResult;

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Print the totals of a training or evaluation run
pub fn print_result(result: &TrainingResult) {
    print_kv("Episodes", &format_number(result.episodes));
    print_kv("Ticks", &format_number(result.ticks));
    print_kv("Total reward", &format!("{:.1}", result.total_reward));
    print_kv("Mean reward", &format!("{:.2}", result.mean_reward));
    if let Some(best) = result.best_episode_reward {
        print_kv("Best episode", &format!("{best:.1}"));
    }
    print_kv("Checkpoints", &format_number(result.checkpoints));
}
