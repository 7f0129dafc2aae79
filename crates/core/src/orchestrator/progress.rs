//! Progress math. Every site weighs `1/total`; a running site earns half.

/// Progress while site number `completed` (0-based) is still running.
pub fn partial_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = completed as f64 / total as f64 + 0.5 / total as f64;
    to_percent(ratio)
}

/// Progress once `completed` sites have finished.
pub fn site_completed_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    to_percent(completed as f64 / total as f64)
}

fn to_percent(ratio: f64) -> u8 {
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Fills `{total}` in the completion message template.
pub fn completion_message(template: &str, total_found: u64) -> String {
    template.replace("{total}", &total_found.to_string())
}
