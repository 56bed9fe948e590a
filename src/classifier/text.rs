//! Cell text cleanup and numeric parsing.

/// Entities decoded in cell text. `&amp;` must stay last so that text such
/// as `&amp;lt;` decodes to `&lt;` and not to `<`.
const ENTITIES: [(&str, &str); 4] = [("&nbsp;", " "), ("&lt;", "<"), ("&gt;", ">"), ("&amp;", "&")];

/// Decodes the supported entities in order.
pub fn decode_entities(s: &str) -> String {
    ENTITIES
        .iter()
        .fold(s.to_string(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
}

/// Decodes entities and trims surrounding whitespace from raw cell text.
pub fn clean_cell_text(raw: &str) -> String {
    decode_entities(raw).trim().to_string()
}

/// Parses the longest numeric prefix of `s` as a float.
///
/// Leading whitespace is skipped and trailing text is ignored, so
/// `"12 tests"` parses as 12. Returns `None` when no number starts the
/// string.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        let value = f64::INFINITY;
        return Some(if s.starts_with('-') { -value } else { value });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a&nbsp;b"), "a b");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("R&amp;D"), "R&D");
    }

    #[test]
    fn test_amp_decoded_last() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("&amp;nbsp;"), "&nbsp;");
    }

    #[test]
    fn test_clean_cell_text_trims() {
        assert_eq!(clean_cell_text("&nbsp; Unit Tests \n"), "Unit Tests");
    }

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_leading_float("12"), Some(12.0));
        assert_eq!(parse_leading_float("3.5"), Some(3.5));
        assert_eq!(parse_leading_float("-2"), Some(-2.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("7."), Some(7.0));
        assert_eq!(parse_leading_float("1e3"), Some(1000.0));
    }

    #[test]
    fn test_parse_numeric_prefix() {
        assert_eq!(parse_leading_float("12 tests"), Some(12.0));
        assert_eq!(parse_leading_float("  40%"), Some(40.0));
        assert_eq!(parse_leading_float("1,234"), Some(1.0));
        assert_eq!(parse_leading_float("2e"), Some(2.0));
        assert_eq!(parse_leading_float("5.x"), Some(5.0));
    }

    #[test]
    fn test_parse_not_a_number() {
        assert_eq!(parse_leading_float("N/A"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float("tests: 5"), None);
    }

    #[test]
    fn test_parse_infinity() {
        assert_eq!(parse_leading_float("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_leading_float("-Infinity"), Some(f64::NEG_INFINITY));
    }
}
