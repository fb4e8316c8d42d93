//! `HH:MM:SS` rendering of elapsed seconds and the matching parser used for
//! manual time edits.

/// Render seconds as zero-padded `HH:MM:SS`.  Hours are not wrapped at 24;
/// negative input renders as `00:00:00`.
pub fn format_elapsed(seconds: i64) -> String {
    if seconds < 0 {
        return "00:00:00".to_owned();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parse `HH:MM:SS`, `MM:SS` or a bare number of seconds.
///
/// Minutes and seconds must be below 60 when a larger unit is present.
/// Values that do not fit in a `u64` are rejected.
pub fn parse_elapsed(input: &str) -> Option<u64> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    let nums: Vec<u64> = parts
        .iter()
        .map(|p| p.trim().parse::<u64>().ok())
        .collect::<Option<_>>()?;

    match nums.as_slice() {
        [secs] => Some(*secs),
        [m, s] if *s < 60 => m.checked_mul(60)?.checked_add(*s),
        [h, m, s] if *m < 60 && *s < 60 => h.checked_mul(3600)?.checked_add(m * 60 + s),
        _ => None,
    }
}
