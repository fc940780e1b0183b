use crate::error::{CoreError, Result};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

const SEC_IN_MIN: u64 = 60;
const SEC_IN_HOUR: u64 = SEC_IN_MIN * 60;
const SEC_IN_DAY: u64 = SEC_IN_HOUR * 24;

fn component_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+)\s*([dhms])").unwrap_or_else(|_| unreachable!("component regex is valid"))
    })
}

/// Parse an idle window such as `1d12h`, `30m` or `2h 15s`.
///
/// Each of `d`, `h`, `m`, `s` counts once (its first occurrence). Blank input means "no
/// window" and yields `None`. Negative input, or input without any recognizable
/// component, is rejected.
pub fn parse_duration(raw: &str) -> Result<Option<Duration>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if raw.starts_with('-') {
        return Err(CoreError::InvalidDuration(format!(
            "Negative times aren't allowed! {raw}"
        )));
    }

    let mut seen = [false; 4];
    let mut seconds: u64 = 0;
    for caps in component_regex().captures_iter(raw) {
        let (slot, unit) = match &caps[2] {
            "d" => (0, SEC_IN_DAY),
            "h" => (1, SEC_IN_HOUR),
            "m" => (2, SEC_IN_MIN),
            _ => (3, 1),
        };
        if seen[slot] {
            continue;
        }
        seen[slot] = true;
        let value: u64 = caps[1]
            .parse()
            .map_err(|_| CoreError::InvalidDuration(format!("Number too large: {raw}")))?;
        seconds = value
            .checked_mul(unit)
            .and_then(|part| seconds.checked_add(part))
            .ok_or_else(|| CoreError::InvalidDuration(format!("Duration too large: {raw}")))?;
    }

    if !seen.iter().any(|s| *s) {
        return Err(CoreError::InvalidDuration(format!(
            "Expected something like 1d12h, got {raw}"
        )));
    }
    Ok(Some(Duration::from_secs(seconds)))
}
