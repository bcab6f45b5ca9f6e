// Duration helpers for YouTube's ISO-8601 `contentDetails.duration` values

/// Parses `PT#H#M#S` into `(hours, minutes, seconds)`.
///
/// Every component is optional but they must appear in H, M, S order.
/// Returns `None` for anything else (day components included).
pub fn parse_iso8601_duration(raw: &str) -> Option<(u64, u64, u64)> {
    let mut rest = raw.trim().strip_prefix("PT")?;
    let mut parts = [0u64; 3];
    let mut next_slot = 0;

    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        let value: u64 = rest[..digits].parse().ok()?;
        let slot = match rest[digits..].chars().next()? {
            'H' => 0,
            'M' => 1,
            'S' => 2,
            _ => return None,
        };
        // H, M, S each at most once and in order
        if slot < next_slot {
            return None;
        }
        parts[slot] = value;
        next_slot = slot + 1;
        rest = &rest[digits + 1..];
    }

    Some((parts[0], parts[1], parts[2]))
}

/// Formats an ISO-8601 duration for display: `H:MM:SS` with hours, else `M:SS`.
/// Malformed or empty input gives an empty string.
pub fn format_iso8601_duration(raw: &str) -> String {
    match parse_iso8601_duration(raw) {
        Some((hours, minutes, seconds)) if hours > 0 => {
            format!("{hours}:{minutes:02}:{seconds:02}")
        }
        Some((_, minutes, seconds)) => format!("{minutes}:{seconds:02}"),
        None => String::new(),
    }
}

/// Reads a display string (`M:SS` or `H:MM:SS`) back into seconds.
pub fn parse_display_duration(display: &str) -> Option<u64> {
    let display = display.trim();
    if display.is_empty() {
        return None;
    }
    display
        .split(':')
        .try_fold(0u64, |acc, part| acc.checked_mul(60)?.checked_add(part.parse::<u64>().ok()?))
}
