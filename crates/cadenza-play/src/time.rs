//! Clock-string and progress helpers shared by the player surfaces.

/// `"M:SS"` below an hour, `"H:MM:SS"` from an hour on.
///
/// Negative or non-finite input renders as `"0:00"`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "input is finite and non-negative past the guard"
)]
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0:00".to_string();
    }
    let total = secs.floor() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Parse `SS`, `M:SS` or `H:MM:SS` back into seconds.
///
/// Minutes and seconds after the leading field must be below 60.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "clock values are far below 2^52")]
pub fn parse_time(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    let mut total: u64 = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u64 = part.parse().ok()?;
        if i > 0 && value >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total as f64)
}

/// Position of `time` within `duration` as a percentage in `[0, 100]`.
///
/// Returns 0 for non-finite inputs and non-positive durations.
#[must_use]
pub fn time_to_percent(time: f64, duration: f64) -> f64 {
    if !time.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    (time / duration * 100.0).clamp(0.0, 100.0)
}

/// Human bitrate for quality menus: `"800 kbps"`, `"2.5 Mbps"`.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "display only")]
pub fn format_bitrate(bps: u64) -> String {
    if bps >= 1_000_000 {
        let mbps = format!("{:.1}", bps as f64 / 1_000_000.0);
        let mbps = mbps.strip_suffix(".0").unwrap_or(&mbps);
        format!("{mbps} Mbps")
    } else {
        format!("{} kbps", (bps as f64 / 1000.0).round())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.0, "0:00")]
    #[case(1.0, "0:01")]
    #[case(30.0, "0:30")]
    #[case(59.0, "0:59")]
    #[case(60.0, "1:00")]
    #[case(90.0, "1:30")]
    #[case(3599.0, "59:59")]
    #[case(3600.0, "1:00:00")]
    #[case(3661.0, "1:01:01")]
    #[case(7384.0, "2:03:04")]
    #[case(59.9, "0:59")]
    fn formats_clock(#[case] secs: f64, #[case] expected: &str) {
        assert_eq!(format_time(secs), expected);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(-5.0)]
    fn formats_garbage_as_zero(#[case] secs: f64) {
        assert_eq!(format_time(secs), "0:00");
    }

    #[rstest]
    fn format_parse_round_trip(
        #[values(0.0, 1.0, 30.0, 59.0, 60.0, 90.0, 3599.0, 3600.0, 3661.0, 7384.0)] secs: f64,
    ) {
        assert_eq!(parse_time(&format_time(secs)), Some(secs));
    }

    #[rstest]
    #[case("45", Some(45.0))]
    #[case(" 2:05 ", Some(125.0))]
    #[case("01:00:00", Some(3600.0))]
    #[case("", None)]
    #[case("1:60", None)]
    #[case("1:2:3:4", None)]
    #[case("a:00", None)]
    #[case("-1:00", None)]
    #[case("1::00", None)]
    fn parses_clock(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_time(text), expected);
    }

    #[rstest]
    #[case(30.0, 120.0, 25.0)]
    #[case(0.0, 120.0, 0.0)]
    #[case(120.0, 120.0, 100.0)]
    #[case(-10.0, 120.0, 0.0)]
    #[case(500.0, 120.0, 100.0)]
    #[case(10.0, 0.0, 0.0)]
    #[case(10.0, -3.0, 0.0)]
    #[case(f64::NAN, 120.0, 0.0)]
    #[case(10.0, f64::NAN, 0.0)]
    #[case(f64::INFINITY, 120.0, 0.0)]
    #[case(10.0, f64::INFINITY, 0.0)]
    fn percent_is_clamped(#[case] time: f64, #[case] duration: f64, #[case] expected: f64) {
        let pct = time_to_percent(time, duration);
        assert!((pct - expected).abs() < 1e-9, "{pct} != {expected}");
        assert!((0.0..=100.0).contains(&pct));
    }

    #[rstest]
    #[case(800_000, "800 kbps")]
    #[case(2_500_000, "2.5 Mbps")]
    #[case(6_000_000, "6 Mbps")]
    #[case(0, "0 kbps")]
    fn formats_bitrate(#[case] bps: u64, #[case] expected: &str) {
        assert_eq!(format_bitrate(bps), expected);
    }
}
