/// Render milliseconds as `HH:MM:SS`. Hours widen past two digits instead of
/// wrapping; the sub-second remainder is dropped.
pub fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Compact hour label used under chart bars, e.g. `1.5h`.
pub fn format_hours(ms: u64) -> String {
    format!("{:.1}h", ms as f64 / 3_600_000.0)
}
