//! Duration arguments: `500ms`, `5s`, `2m`, `1h`, or bare seconds.

use std::time::Duration;

/// Parses a duration argument for clap.
pub(crate) fn parse(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("invalid duration {s:?}: expected a number"));
    }
    let n: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration {s:?}: {e}"))?;
    match unit.trim() {
        "ms" => Ok(Duration::from_millis(n)),
        "" | "s" => Ok(Duration::from_secs(n)),
        "m" => Ok(Duration::from_secs(n.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(n.saturating_mul(3600))),
        other => Err(format!("invalid duration {s:?}: unknown unit {other:?}")),
    }
}
