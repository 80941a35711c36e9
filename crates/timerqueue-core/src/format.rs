//! Millisecond durations to and from display text.

use crate::error::ValidationError;

const MS_PER_SEC: u64 = 1000;
const MS_PER_MIN: u64 = 60 * MS_PER_SEC;
const MS_PER_HOUR: u64 = 60 * MS_PER_MIN;

/// Format a duration as `MM:SS`, or `H:MM:SS` from one hour up.
///
/// Seconds are floored, so 59_999 ms is `00:59`.
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / MS_PER_SEC;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Format a countdown. Rounds up to the next whole second so the display
/// only reads `00:00` once the timer has actually run out.
pub fn format_remaining(ms: u64) -> String {
    let rounded = ms.div_ceil(MS_PER_SEC).saturating_mul(MS_PER_SEC);
    format_duration(rounded)
}

/// Parse a human duration into milliseconds.
///
/// Accepts unit-suffixed parts (`90s`, `5m`, `1h30m`, `1.5m`, `250ms`) and
/// bare numbers, which are read as minutes.
pub fn parse_duration(input: &str) -> Result<u64, ValidationError> {
    let text = input.trim().to_ascii_lowercase();
    let invalid = |message: &str| ValidationError::InvalidDuration {
        input: input.to_string(),
        message: message.to_string(),
    };

    if text.is_empty() {
        return Err(invalid("empty input"));
    }

    if let Ok(minutes) = text.parse::<f64>() {
        let ms = to_ms(minutes, MS_PER_MIN).ok_or_else(|| invalid("out of range"))?;
        if ms == 0 {
            return Err(invalid("duration must be greater than zero"));
        }
        return Ok(ms);
    }

    let mut total: u64 = 0;
    let mut rest = text.as_str();
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| invalid("missing unit after number"))?;
        if number_end == 0 {
            return Err(invalid("expected a number"));
        }
        let (number, tail) = rest.split_at(number_end);
        let value: f64 = number.parse().map_err(|_| invalid("bad number"))?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        let scale = match unit.trim() {
            "ms" => 1,
            "s" | "sec" | "secs" => MS_PER_SEC,
            "m" | "min" | "mins" => MS_PER_MIN,
            "h" | "hr" | "hrs" => MS_PER_HOUR,
            other => return Err(invalid(&format!("unknown unit '{other}'"))),
        };

        let part = to_ms(value, scale).ok_or_else(|| invalid("out of range"))?;
        total = total
            .checked_add(part)
            .ok_or_else(|| invalid("out of range"))?;
        rest = next;
    }

    if total == 0 {
        return Err(invalid("duration must be greater than zero"));
    }
    Ok(total)
}

fn to_ms(value: f64, scale: u64) -> Option<u64> {
    let ms = (value * scale as f64).round();
    if !ms.is_finite() || ms < 0.0 || ms >= u64::MAX as f64 {
        return None;
    }
    Some(ms as u64)
}
