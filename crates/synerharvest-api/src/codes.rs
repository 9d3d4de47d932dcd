//! Batch code and QR URL synthesis.
//!
//! Codes are derived from the first three letters of the name plus a
//! timestamp component, which keeps them human-scannable while staying
//! unique enough for label printing. The unique index on the column is
//! the real collision guard.

use chrono::{DateTime, Utc};

/// Uppercase three-letter prefix taken from the name, "PRD" when the
/// name has no usable characters.
fn prefix(name: &str) -> String {
    let letters: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    if letters.is_empty() {
        "PRD".to_string()
    } else {
        letters
    }
}

/// Synthesize a product label code, e.g. "TOM-20250815103000".
pub fn product_code(name: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", prefix(name), now.format("%Y%m%d%H%M%S"))
}

/// Synthesize a batch code, e.g. "TOM-27154938". The numeric tail is the
/// low-order end of the epoch-millisecond clock.
pub fn batch_code(product_name: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().to_string();
    let tail = millis.get(5..).unwrap_or(&millis);
    format!("{}-{}", prefix(product_name), tail)
}

/// Public QR landing URL for a product label code.
pub fn product_qr_url(batch_code: &str) -> String {
    format!("https://synerharvest.com/qr/product/{batch_code}")
}

/// Public QR landing URL for a batch code.
pub fn batch_qr_url(batch_code: &str) -> String {
    format!("https://synerharvest.com/qr/batch/{batch_code}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_product_code_shape() {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 10, 30, 0).unwrap();
        assert_eq!(product_code("Tomatoes", now), "TOM-20250815103000");
    }

    #[test]
    fn test_prefix_skips_non_alphanumerics() {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 10, 30, 0).unwrap();
        assert!(product_code("  green beans", now).starts_with("GRE-"));
        assert!(product_code("!!", now).starts_with("PRD-"));
    }

    #[test]
    fn test_batch_code_uses_millisecond_tail() {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 10, 30, 0).unwrap();
        let code = batch_code("Tomatoes", now);
        let (head, tail) = code.split_once('-').unwrap();
        assert_eq!(head, "TOM");
        assert!(tail.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(tail.len(), now.timestamp_millis().to_string().len() - 5);
    }

    #[test]
    fn test_qr_urls() {
        assert_eq!(
            product_qr_url("TOM-20250815103000"),
            "https://synerharvest.com/qr/product/TOM-20250815103000"
        );
        assert_eq!(
            batch_qr_url("TOM-27154938"),
            "https://synerharvest.com/qr/batch/TOM-27154938"
        );
    }
}
