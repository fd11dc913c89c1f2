/// English ordinal suffix for a 1-based position: `st`, `nd`, `rd` or `th`.
pub fn ordinal_suffix(position: usize) -> &'static str {
    match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

pub fn ordinal(position: usize) -> String {
    format!("{position}{}", ordinal_suffix(position))
}

/// Compact duration label, e.g. `2h 5m`, `5m` or `42s`.
pub fn pretty_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_suffixes() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (102, "102nd"),
            (111, "111th"),
        ];
        for (position, expected) in cases {
            assert_eq!(ordinal(position), expected);
        }
    }

    #[test]
    fn durations() {
        assert_eq!(pretty_duration(0), "0s");
        assert_eq!(pretty_duration(42), "42s");
        assert_eq!(pretty_duration(300), "5m");
        assert_eq!(pretty_duration(7200), "2h");
        assert_eq!(pretty_duration(7500), "2h 5m");
    }
}
