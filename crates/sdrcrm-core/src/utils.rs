//! Formatting and arithmetic helpers shared by every view

/// Round half toward positive infinity, matching the rounding the backend's
/// web UI applies to percentages.
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Percentage change between two periods.
///
/// `prev > 0 ? round((curr - prev) / prev * 100) : 0`
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn pct_change(curr: f64, prev: f64) -> i64 {
    if prev > 0.0 && curr.is_finite() {
        round_half_up((curr - prev) / prev * 100.0) as i64
    } else {
        0
    }
}

/// `part` as a whole percentage of `total`, zero when `total` is not positive
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn percent_of(part: f64, total: f64) -> i64 {
    if total > 0.0 && part.is_finite() {
        round_half_up(part / total * 100.0) as i64
    } else {
        0
    }
}

/// Format an amount as Indian rupees with no decimals, e.g. `₹1,23,456`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return "₹0".to_string();
    }

    let rounded = amount.round();
    let digits = (rounded.abs() as u64).to_string();
    let sign = if rounded < 0.0 { "-" } else { "" };

    format!("{sign}₹{}", group_indian(&digits))
}

/// Compact INR for chart axes: `₹1.2Cr`, `₹4.5L`, `₹12K`
#[must_use]
pub fn format_inr_compact(amount: f64) -> String {
    let abs = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };

    if abs >= 10_000_000.0 {
        format!("{sign}₹{:.1}Cr", abs / 10_000_000.0)
    } else if abs >= 100_000.0 {
        format!("{sign}₹{:.1}L", abs / 100_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}₹{:.0}K", abs / 1_000.0)
    } else {
        format_inr(amount)
    }
}

// 1234567 -> 12,34,567: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// Case-insensitive substring match used by list page search boxes
#[must_use]
pub fn matches_search(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Canonical form of a stage or status label.
///
/// Case, `_`/`-` separators and repeated whitespace are ignored, so
/// `"closed_won"`, `"Closed Won"` and `" closed-won "` compare equal.
#[must_use]
pub fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serde helpers that read sloppy numeric fields as zero instead of failing
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_f64(value: &Value) -> f64 {
        match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
            Value::Bool(b) => f64::from(u8::from(*b)),
            _ => 0.0,
        }
    }

    /// Number, numeric string, or anything else as `0.0`
    pub fn f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map_or(0.0, to_f64))
    }

    /// Non-negative count; negative or fractional input is clamped/truncated
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let n = value.as_ref().map_or(0.0, to_f64);
        Ok(if n.is_finite() && n > 0.0 { n as u64 } else { 0 })
    }

    /// A list that may be `null`
    pub fn vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// A string that may be `null` or a number
    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde::Deserialize;

    #[rstest]
    #[case(0.0, 0.0, 0)]
    #[case(150.0, 0.0, 0)]
    #[case(150.0, 100.0, 50)]
    #[case(50.0, 100.0, -50)]
    #[case(100.0, 100.0, 0)]
    #[case(1.0, 3.0, -67)]
    #[case(87.5, 100.0, -12)]
    #[case(0.0, 100.0, -100)]
    fn test_pct_change(#[case] curr: f64, #[case] prev: f64, #[case] expected: i64) {
        assert_eq!(pct_change(curr, prev), expected);
    }

    #[test]
    fn test_percent_of_guards_zero_denominator() {
        assert_eq!(percent_of(5.0, 0.0), 0);
        assert_eq!(percent_of(0.0, 0.0), 0);
        assert_eq!(percent_of(2.0, 3.0), 67);
        assert_eq!(percent_of(3.0, 3.0), 100);
    }

    #[rstest]
    #[case(0.0, "₹0")]
    #[case(999.0, "₹999")]
    #[case(1000.0, "₹1,000")]
    #[case(123_456.0, "₹1,23,456")]
    #[case(1_234_567.0, "₹12,34,567")]
    #[case(123_456_789.0, "₹12,34,56,789")]
    #[case(1499.6, "₹1,500")]
    #[case(-25_000.0, "-₹25,000")]
    #[case(f64::NAN, "₹0")]
    fn test_format_inr(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(format_inr(amount), expected);
    }

    #[test]
    fn test_format_inr_compact() {
        assert_eq!(format_inr_compact(25_000_000.0), "₹2.5Cr");
        assert_eq!(format_inr_compact(450_000.0), "₹4.5L");
        assert_eq!(format_inr_compact(12_000.0), "₹12K");
        assert_eq!(format_inr_compact(800.0), "₹800");
    }

    #[rstest]
    #[case("closed_won", "closed won")]
    #[case("  Closed   Won ", "closed won")]
    #[case("in-progress", "in progress")]
    #[case("New", "new")]
    fn test_normalize_label(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_label(raw), expected);
    }

    #[test]
    fn test_matches_search() {
        assert!(matches_search("Acme Industries", "acme"));
        assert!(matches_search("Acme Industries", "  "));
        assert!(!matches_search("Acme Industries", "globex"));
    }

    #[derive(Deserialize)]
    struct Sloppy {
        #[serde(default, deserialize_with = "lenient::f64")]
        amount: f64,
        #[serde(default, deserialize_with = "lenient::u64")]
        count: u64,
        #[serde(default, deserialize_with = "lenient::vec")]
        items: Vec<u32>,
        #[serde(default, deserialize_with = "lenient::string")]
        name: String,
    }

    #[test]
    fn test_lenient_fields() {
        let s: Sloppy =
            serde_json::from_str(r#"{"amount": "1200.5", "count": null, "items": null, "name": 7}"#)
                .unwrap();
        assert_eq!(s.amount, 1200.5);
        assert_eq!(s.count, 0);
        assert!(s.items.is_empty());
        assert_eq!(s.name, "7");

        let missing: Sloppy = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.amount, 0.0);
        assert_eq!(missing.count, 0);

        let negative: Sloppy = serde_json::from_str(r#"{"count": -4, "amount": "abc"}"#).unwrap();
        assert_eq!(negative.count, 0);
        assert_eq!(negative.amount, 0.0);
    }

    proptest! {
        #[test]
        fn prop_pct_change_zero_prev_is_zero(curr in -1.0e9f64..1.0e9) {
            prop_assert_eq!(pct_change(curr, 0.0), 0);
        }

        #[test]
        fn prop_format_inr_keeps_digits(amount in 0u64..10_000_000_000) {
            #[allow(clippy::cast_precision_loss)]
            let formatted = format_inr(amount as f64);
            let digits: String = formatted.chars().filter(char::is_ascii_digit).collect();
            prop_assert_eq!(digits, amount.to_string());
        }
    }
}
