use crate::consts::IDENTIFIER_REGEX;
use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// The unique per-item code that must survive every shortening step.
///
/// Stored without its braces (`ASIN.B0CW3NF5NY`); [`Display`] renders the
/// braced token (`{ASIN.B0CW3NF5NY}`) exactly as it appears in names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Identifier {
    value: String,
}
impl Identifier {
    /// Used by the parser, which has already matched the pattern.
    pub(crate) fn from_match(value: &str) -> Self {
        Self { value: value.to_string() }
    }

    /// The part before the dot, e.g. `ASIN`.
    pub fn prefix(&self) -> &str {
        self.value.split_once('.').map(|(prefix, _)| prefix).unwrap_or(self.value.as_str())
    }

    /// The part after the dot, e.g. `B0CW3NF5NY`.
    pub fn code(&self) -> &str {
        self.value.split_once('.').map(|(_, code)| code).unwrap_or_default()
    }

    /// The bare identifier without braces.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The braced token as it must appear in every rendered name.
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Identifier {
    type Err = Error;

    /// Accepts either the braced token or the bare `PREFIX.CODE` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let braced = match trimmed.starts_with('{') {
            true => trimmed.to_string(),
            false => format!("{{{trimmed}}}"),
        };
        match IDENTIFIER_REGEX.captures(&braced) {
            Some(captures) if captures.get(0).is_some_and(|m| m.as_str() == braced) => {
                Ok(Self::from_match(&captures[1]))
            },
            _ => exn::bail!(ErrorKind::MissingIdentifier(s.to_string())),
        }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{{{}}}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{ASIN.B0CW3NF5NY}", "ASIN", "B0CW3NF5NY")]
    #[case("ASIN.B0CW3NF5NY", "ASIN", "B0CW3NF5NY")]
    #[case("{ID.ABC123}", "ID", "ABC123")]
    #[case(" {ISBN13.9780316} ", "ISBN13", "9780316")]
    fn test_from_str(#[case] input: &str, #[case] prefix: &str, #[case] code: &str) {
        let identifier: Identifier = input.parse().unwrap();
        assert_eq!(identifier.prefix(), prefix);
        assert_eq!(identifier.code(), code);
        assert_eq!(identifier.token(), format!("{{{prefix}.{code}}}"));
    }

    #[rstest]
    #[case("")]
    #[case("{asin.b0cw3nf5ny}")]
    #[case("{ASIN}")]
    #[case("{ASIN.B0-CW}")]
    #[case("prefix {ASIN.B0CW3NF5NY}")]
    fn test_from_str_invalid(#[case] input: &str) {
        assert!(input.parse::<Identifier>().is_err());
    }

    #[test]
    fn test_display_is_braced() {
        let identifier: Identifier = "ID.ABC123".parse().unwrap();
        assert_eq!(identifier.to_string(), "{ID.ABC123}");
        assert_eq!(identifier.as_str(), "ID.ABC123");
    }
}
