//! Aggregated multi-order report formatting.

use panelbot_types::{CommandKind, OrderOutcome};

/// Success lines shown before abbreviating.
pub const MAX_SUCCESS_LINES: usize = 20;
/// Failure lines shown before abbreviating.
pub const MAX_FAILURE_LINES: usize = 10;

/// Render outcomes as one chat reply.
///
/// A single order renders as its message alone; bulk runs get a header,
/// capped success/failure sections, and a summary line.
pub fn format_report(kind: CommandKind, outcomes: &[OrderOutcome]) -> String {
    if outcomes.len() == 1 {
        return outcomes[0].message.clone();
    }

    let successes: Vec<&OrderOutcome> = outcomes.iter().filter(|o| o.success).collect();
    let failures: Vec<&OrderOutcome> = outcomes.iter().filter(|o| !o.success).collect();

    let mut out = String::new();
    out.push_str(&format!(
        "{} report — {} orders\n",
        capitalize(kind.as_str()),
        outcomes.len()
    ));

    for outcome in successes.iter().take(MAX_SUCCESS_LINES) {
        out.push_str(&format!("{}\n", outcome.message));
    }
    if successes.len() > MAX_SUCCESS_LINES {
        out.push_str(&format!(
            "... and {} more succeeded\n",
            successes.len() - MAX_SUCCESS_LINES
        ));
    }

    for outcome in failures.iter().take(MAX_FAILURE_LINES) {
        out.push_str(&format!("❌ {}: {}\n", outcome.order_id, outcome.message));
    }
    if failures.len() > MAX_FAILURE_LINES {
        out.push_str(&format!(
            "... and {} more failed\n",
            failures.len() - MAX_FAILURE_LINES
        ));
    }

    out.push_str(&format!(
        "Total: {} · Success: {} · Failed: {}",
        outcomes.len(),
        successes.len(),
        failures.len()
    ));
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
