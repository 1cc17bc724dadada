/// Abbreviates counters for display: thousands get a `K` suffix, millions an
/// `M`, one decimal at most and a bare `1M` rather than `1.0M`.
pub fn format_count(count: i64) -> String {
    const MILLION: i64 = 1_000_000;
    const THOUSAND: i64 = 1_000;

    if count >= MILLION {
        with_suffix(count as f64 / MILLION as f64, "M")
    } else if count >= THOUSAND {
        with_suffix(count as f64 / THOUSAND as f64, "K")
    } else {
        count.to_string()
    }
}

fn with_suffix(scaled: f64, suffix: &str) -> String {
    let rounded = format!("{:.1}", scaled);
    let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);
    format!("{trimmed}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::format_count;

    #[test]
    fn small_counts_stay_raw() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(950), "950");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn thousands_get_one_decimal() {
        assert_eq!(format_count(1_000), "1K");
        assert_eq!(format_count(1_500), "1.5K");
        assert_eq!(format_count(12_340), "12.3K");
    }

    #[test]
    fn millions_trim_trailing_zero() {
        assert_eq!(format_count(1_000_000), "1M");
        assert_eq!(format_count(2_300_000), "2.3M");
    }
}
