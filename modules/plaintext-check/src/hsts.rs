//! Strict `Strict-Transport-Security` parsing.

use thiserror::Error;

/// 90 days, the shortest max-age accepted as adequate protection.
pub const MIN_SECURE_MAX_AGE: u64 = 7_776_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HstsError {
    #[error("no max-age directive")]
    MissingMaxAge,
    #[error("max-age given more than once")]
    DuplicateMaxAge,
    #[error("max-age value {0:?} is not a decimal integer")]
    BadMaxAge(String),
}

/// Extract `max-age` from a header value such as
/// `max-age=31536000; includeSubDomains`. Directive names are matched
/// case-insensitively and the value may be quoted; anything else in the value
/// is an error.
pub fn parse_max_age(header: &str) -> Result<u64, HstsError> {
    let mut found = None;
    for directive in header.split(';') {
        let Some((name, value)) = directive.split_once('=') else { continue };
        if !name.trim().eq_ignore_ascii_case("max-age") {
            continue;
        }
        if found.is_some() {
            return Err(HstsError::DuplicateMaxAge);
        }
        let value = value.trim();
        let digits = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HstsError::BadMaxAge(value.to_string()));
        }
        let age = digits.parse::<u64>().map_err(|_| HstsError::BadMaxAge(value.to_string()))?;
        found = Some(age);
    }
    found.ok_or(HstsError::MissingMaxAge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_directive() {
        assert_eq!(parse_max_age("max-age=31536000"), Ok(31_536_000));
    }

    #[test]
    fn extra_directives_and_spacing() {
        assert_eq!(parse_max_age("includeSubDomains; Max-Age = 3600 ; preload"), Ok(3600));
        assert_eq!(parse_max_age("max-age=\"7776000\""), Ok(7_776_000));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_max_age("includeSubDomains"), Err(HstsError::MissingMaxAge));
        assert_eq!(parse_max_age(""), Err(HstsError::MissingMaxAge));
        assert!(matches!(parse_max_age("max-age=1y"), Err(HstsError::BadMaxAge(_))));
        assert!(matches!(parse_max_age("max-age="), Err(HstsError::BadMaxAge(_))));
        assert!(matches!(parse_max_age("max-age=-5"), Err(HstsError::BadMaxAge(_))));
        assert_eq!(parse_max_age("max-age=1; max-age=2"), Err(HstsError::DuplicateMaxAge));
    }

    #[test]
    fn does_not_strip_digits_from_junk() {
        // a digit-filtering parse would read this as 31536000
        assert!(parse_max_age("max-age=31a536000").is_err());
    }
}
