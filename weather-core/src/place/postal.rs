use std::fmt::Debug;

/// Checks a postal code against the format used by a country.
pub trait PostalCodeFormat: Send + Sync + Debug {
    fn is_valid(&self, country_code: &str, postal_code: &str) -> bool;
}

/// Shape-based postal code formats.
///
/// In a shape `9` is a digit, `A` a letter, `*` a letter or digit; any other
/// character must match literally. Countries without an entry accept any
/// short alphanumeric code.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostalCodeShapes;

#[rustfmt::skip]
const SHAPES: &[(&str, &[&str])] = &[
    ("AT", &["9999"]),
    ("AU", &["9999"]),
    ("BE", &["9999"]),
    ("BR", &["99999-999", "99999999"]),
    ("CA", &["A9A 9A9", "A9A9A9"]),
    ("CH", &["9999"]),
    ("CN", &["999999"]),
    ("DE", &["99999"]),
    ("DK", &["9999"]),
    ("ES", &["99999"]),
    ("FI", &["99999"]),
    ("FR", &["99999"]),
    ("GB", &["A9 9AA", "A99 9AA", "AA9 9AA", "AA99 9AA", "A9A 9AA", "AA9A 9AA"]),
    ("IE", &["A9* ****"]),
    ("IN", &["999999"]),
    ("IT", &["99999"]),
    ("JP", &["999-9999", "9999999"]),
    ("KR", &["99999"]),
    ("MX", &["99999"]),
    ("NL", &["9999 AA", "9999AA"]),
    ("NO", &["9999"]),
    ("NZ", &["9999"]),
    ("PL", &["99-999"]),
    ("PT", &["9999-999"]),
    ("RU", &["999999"]),
    ("SE", &["999 99", "99999"]),
    ("US", &["99999", "99999-9999"]),
];

const MAX_UNLISTED_LEN: usize = 10;

fn matches_shape(shape: &str, code: &str) -> bool {
    shape.chars().count() == code.chars().count()
        && shape.chars().zip(code.chars()).all(|(s, c)| match s {
            '9' => c.is_ascii_digit(),
            'A' => c.is_ascii_alphabetic(),
            '*' => c.is_ascii_alphanumeric(),
            literal => literal == c,
        })
}

impl PostalCodeFormat for PostalCodeShapes {
    fn is_valid(&self, country_code: &str, postal_code: &str) -> bool {
        let code = postal_code.trim();
        if code.is_empty() {
            return false;
        }

        match SHAPES.iter().find(|(country, _)| *country == country_code) {
            Some((_, shapes)) => shapes.iter().any(|shape| matches_shape(shape, code)),
            None => {
                code.len() <= MAX_UNLISTED_LEN
                    && code.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_zip_codes() {
        let f = PostalCodeShapes;
        assert!(f.is_valid("US", "91913"));
        assert!(f.is_valid("US", "91913-0001"));
        assert!(!f.is_valid("US", "9191"));
        assert!(!f.is_valid("US", "9191A"));
        assert!(!f.is_valid("US", ""));
    }

    #[test]
    fn alphanumeric_formats() {
        let f = PostalCodeShapes;
        assert!(f.is_valid("CA", "K1A 0B1"));
        assert!(f.is_valid("GB", "SW1A 1AA"));
        assert!(f.is_valid("GB", "M1 1AE"));
        assert!(f.is_valid("IE", "A65 F4E2"));
        assert!(!f.is_valid("CA", "12345"));
    }

    #[test]
    fn unlisted_countries_accept_short_codes() {
        let f = PostalCodeShapes;
        assert!(f.is_valid("AR", "C1425"));
        assert!(!f.is_valid("AR", "this is far too long"));
        assert!(!f.is_valid("AR", "12#45"));
    }
}
