//! `MM:SS` rendering of a remaining duration.

use crate::error::ValidationError;

/// Render `secs` as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours; anything at or above 100 minutes
/// renders with a wider minute field.
pub fn format_mm_ss(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Parse `MM:SS` (or bare seconds) back into a number of seconds.
pub fn parse_mm_ss(input: &str) -> Result<u64, ValidationError> {
    let invalid = |message: &str| ValidationError::InvalidDuration {
        input: input.to_string(),
        message: message.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty duration"));
    }

    match trimmed.split_once(':') {
        None => trimmed
            .parse::<u64>()
            .map_err(|_| invalid("expected seconds or MM:SS")),
        Some((min, sec)) => {
            let minutes = min
                .parse::<u64>()
                .map_err(|_| invalid("minutes must be a non-negative integer"))?;
            let seconds = sec
                .parse::<u64>()
                .map_err(|_| invalid("seconds must be a non-negative integer"))?;
            if seconds >= 60 {
                return Err(invalid("seconds must be below 60"));
            }
            minutes
                .checked_mul(60)
                .and_then(|m| m.checked_add(seconds))
                .ok_or_else(|| invalid("duration overflows"))
        }
    }
}
