/// Format seconds as `HH:MM:SS{sep}mmm`.
///
/// Milliseconds are rounded to the nearest value and any overflow carries
/// into the larger fields. Hours are not wrapped and widen past two digits
/// when needed.
pub fn format_timestamp(seconds: f64, sep: char) -> String {
    let total_milliseconds = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, sep, millis)
}

/// Inverse of [`format_timestamp`] for either `,` or `.` separators.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let value = value.trim();
    let (clock, fraction) = value.rsplit_once([',', '.'])?;
    let mut fields = clock.split(':');
    let hours: u64 = fields.next()?.parse().ok()?;
    let minutes: u64 = fields.next()?.parse().ok()?;
    let secs: u64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() || minutes >= 60 || secs >= 60 {
        return None;
    }
    if fraction.is_empty() || fraction.len() > 3 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // "5" means 500 ms, not 5 ms
    let millis: u64 = format!("{:0<3}", fraction).parse().ok()?;

    let total_milliseconds = ((hours * 60 + minutes) * 60 + secs) * 1000 + millis;
    Some(total_milliseconds as f64 / 1000.0)
}
