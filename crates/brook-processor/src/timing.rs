use std::time::Duration;

/// Human-readable elapsed time for entry secondary titles:
/// "4.2 seconds" under a minute, "2 minutes 5 seconds" above.
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor() as u64;
        let remaining = (seconds % 60.0).round() as u64;
        format!(
            "{} {} {} {}",
            minutes,
            pluralize(minutes, "minute"),
            remaining,
            pluralize(remaining, "second"),
        )
    } else {
        format!("{seconds:.1} seconds")
    }
}

/// Terminal summary line for a finished session
pub fn format_reasoned_duration(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64().round() as u64;
    if seconds < 60 {
        format!("Reasoned for {} {}", seconds, pluralize(seconds, "second"))
    } else {
        let minutes = seconds / 60;
        format!("Reasoned for {} {}", minutes, pluralize(minutes, "minute"))
    }
}

fn pluralize(count: u64, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}
