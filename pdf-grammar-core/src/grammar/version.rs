//! PDF version tokens and version gating.

use std::fmt;
use std::str::FromStr;

/// A PDF version such as `1.4` or `2.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct PdfVersion {
    major: u8,
    minor: u8,
}

impl PdfVersion {
    pub const V2_0: PdfVersion = PdfVersion::new(2, 0);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u8 {
        self.major
    }

    pub fn minor(&self) -> u8 {
        self.minor
    }

    /// Whether a key gated by `since`/`deprecated` is current in this version.
    pub fn is_within(&self, since: Option<PdfVersion>, deprecated: Option<PdfVersion>) -> bool {
        since.map_or(true, |since| since <= *self)
            && deprecated.map_or(true, |deprecated| *self < deprecated)
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        Self::V2_0
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PdfVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| format!("invalid PDF version '{s}'"))?;
        let major: u8 = major
            .parse()
            .map_err(|_| format!("invalid PDF version '{s}'"))?;
        let minor: u8 = minor
            .parse()
            .map_err(|_| format!("invalid PDF version '{s}'"))?;
        let valid = match major {
            1 => minor <= 7,
            2 => minor == 0,
            _ => false,
        };
        if !valid {
            return Err(format!("unknown PDF version '{s}'"));
        }
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for PdfVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PdfVersion> for String {
    fn from(version: PdfVersion) -> Self {
        version.to_string()
    }
}

/// Parse an optional version column; an empty field means "no bound".
pub(crate) fn parse_optional(field: &str) -> Result<Option<PdfVersion>, String> {
    let field = field.trim();
    if field.is_empty() {
        Ok(None)
    } else {
        field.parse().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!("1.4".parse::<PdfVersion>(), Ok(PdfVersion::new(1, 4)));
        assert_eq!(" 2.0 ".parse::<PdfVersion>(), Ok(PdfVersion::V2_0));
        assert!("1.8".parse::<PdfVersion>().is_err());
        assert!("2.1".parse::<PdfVersion>().is_err());
        assert!("two".parse::<PdfVersion>().is_err());
        assert!("1".parse::<PdfVersion>().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(PdfVersion::new(1, 7) < PdfVersion::V2_0);
        assert!(PdfVersion::new(1, 2) < PdfVersion::new(1, 10 - 3));
    }

    #[test]
    fn test_is_within() {
        let v17 = PdfVersion::new(1, 7);
        assert!(v17.is_within(None, None));
        assert!(v17.is_within(Some(PdfVersion::new(1, 3)), None));
        assert!(!v17.is_within(Some(PdfVersion::V2_0), None));
        assert!(!PdfVersion::V2_0.is_within(None, Some(PdfVersion::V2_0)));
        assert!(v17.is_within(None, Some(PdfVersion::V2_0)));
    }

    #[test]
    fn test_optional_column() {
        assert_eq!(parse_optional(""), Ok(None));
        assert_eq!(parse_optional("1.5"), Ok(Some(PdfVersion::new(1, 5))));
        assert!(parse_optional("x").is_err());
    }
}
