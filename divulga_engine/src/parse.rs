//! Field-level parsers shared by the normalizer: Brazilian currency
//! strings, mixed-vintage dates, CPF digit handling, and legacy text
//! decoding.

use chrono::NaiveDate;

/// Keeps only ASCII digits.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A CPF is usable for filtering when it has exactly 11 digits after
/// stripping punctuation. Checksum digits are deliberately not verified:
/// the source files carry formatting noise, not forged documents.
pub fn normalize_cpf(s: &str) -> Option<String> {
    let digits = digits_only(s);
    (digits.len() == 11).then_some(digits)
}

/// Parses a monetary amount written with comma as the decimal separator
/// and dot as an optional thousands separator: `"80.000,00"` and
/// `"80000,00"` both mean `80000.0`. Empty input means zero; anything
/// unparseable is `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.replace('.', "").replace(',', ".").parse::<f64>().ok()
}

/// Accepts `DD/MM/YYYY` and `YYYY-MM-DD`, returning the ISO form. Any
/// other shape is `None`, never an error.
pub fn parse_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    for fmt in ["%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

/// Decodes bytes as UTF-8 when valid, otherwise as Latin-1 (every byte
/// maps to the code point of the same value, so this is total). Older
/// dataset vintages are published in ISO-8859-1.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_only_strips_punctuation() {
        assert_eq!(digits_only("111.111.111-11"), "11111111111");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn cpf_requires_eleven_digits() {
        assert_eq!(
            normalize_cpf("111.111.111-11").as_deref(),
            Some("11111111111")
        );
        assert_eq!(normalize_cpf("11111111111").as_deref(), Some("11111111111"));
        assert!(normalize_cpf("1111111111").is_none());
        assert!(normalize_cpf("").is_none());
        assert!(normalize_cpf("12345678901234").is_none());
    }

    #[test]
    fn amount_with_thousands_separator() {
        assert_eq!(parse_amount("80.000,00"), Some(80000.0));
        assert_eq!(parse_amount("1.234.567,89"), Some(1234567.89));
    }

    #[test]
    fn amount_without_thousands_separator() {
        assert_eq!(parse_amount("80000,00"), Some(80000.0));
        assert_eq!(parse_amount("-150,50"), Some(-150.5));
    }

    #[test]
    fn empty_amount_is_zero() {
        assert_eq!(parse_amount(""), Some(0.0));
        assert_eq!(parse_amount("   "), Some(0.0));
    }

    #[test]
    fn garbage_amount_is_none() {
        assert!(parse_amount("#NULO#").is_none());
        assert!(parse_amount("abc").is_none());
    }

    #[test]
    fn dates_both_vintages() {
        assert_eq!(parse_date("15/10/2022").as_deref(), Some("2022-10-15"));
        assert_eq!(parse_date("2022-10-15").as_deref(), Some("2022-10-15"));
    }

    #[test]
    fn bad_dates_are_none() {
        assert!(parse_date("31/02/2022").is_none());
        assert!(parse_date("10-15-2022").is_none());
        assert!(parse_date("").is_none());
        assert!(parse_date("ontem").is_none());
    }

    #[test]
    fn decode_utf8_passthrough() {
        assert_eq!(decode_text("eleição".as_bytes()), "eleição");
    }

    #[test]
    fn decode_latin1_fallback() {
        // "São" in ISO-8859-1: the 0xE3 byte is invalid UTF-8.
        assert_eq!(decode_text(&[b'S', 0xE3, b'o']), "São");
    }
}
