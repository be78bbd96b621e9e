use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    str::FromStr,
    sync::LazyLock,
};

use non_empty_string::NonEmptyString;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A cross-reference identifier for an individual or family unit.
///
/// In the interchange format these are pointer tokens such as `@I12@` or
/// `@F3@`, but any non-empty token without whitespace is accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Xref(NonEmptyString);

impl Xref {
    /// Creates a new `Xref` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`XrefError`] if the string is empty or contains whitespace.
    pub fn new(s: String) -> Result<Self, XrefError> {
        if s.chars().any(char::is_whitespace) {
            return Err(XrefError(s));
        }
        let non_empty = NonEmptyString::new(s).map_err(XrefError)?;
        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Builds the conventional pointer token for the given kind prefix and
    /// index, e.g. `@I7@`.
    pub(crate) fn pointer(prefix: char, index: usize) -> Self {
        Self(
            NonEmptyString::new(format!("@{prefix}{index}@"))
                .unwrap_or_else(|_| unreachable!("pointer tokens are never empty")),
        )
    }

    /// The numeric suffix of a conventional pointer token with the given
    /// kind prefix, if this identifier has that shape.
    pub(crate) fn pointer_index(&self, prefix: char) -> Option<usize> {
        static POINTER: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^@([A-Za-z]+)(\d+)@$").expect("valid pattern"));

        let captures = POINTER.captures(self.as_str())?;
        let mut kind = captures[1].chars();
        match (kind.next(), kind.next()) {
            (Some(c), None) if c.eq_ignore_ascii_case(&prefix) => captures[2].parse().ok(),
            _ => None,
        }
    }
}

impl Hash for Xref {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl TryFrom<String> for Xref {
    type Error = XrefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Xref {
    type Error = XrefError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl FromStr for Xref {
    type Err = XrefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl From<Xref> for String {
    fn from(xref: Xref) -> Self {
        xref.as_str().to_string()
    }
}

impl AsRef<str> for Xref {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Xref {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for Xref {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a usable cross-reference identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid identifier '{0}': must be non-empty and contain no whitespace")]
pub struct XrefError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_pointer_tokens() {
        let xref: Xref = "@I1@".parse().unwrap();
        assert_eq!(xref.as_str(), "@I1@");
        assert_eq!(xref.to_string(), "@I1@");
    }

    #[test]
    fn accepts_arbitrary_tokens() {
        assert!(Xref::try_from("person-42").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Xref::try_from(""), Err(XrefError(String::new())));
    }

    #[test]
    fn rejects_whitespace() {
        assert!(Xref::try_from("@I 1@").is_err());
    }

    #[test]
    fn pointer_index_matches_prefix() {
        let xref = Xref::pointer('I', 12);
        assert_eq!(xref.as_str(), "@I12@");
        assert_eq!(xref.pointer_index('I'), Some(12));
        assert_eq!(xref.pointer_index('F'), None);
    }

    #[test]
    fn pointer_index_ignores_other_shapes() {
        let xref = Xref::try_from("@IND12@").unwrap();
        assert_eq!(xref.pointer_index('I'), None);
        let xref = Xref::try_from("I12").unwrap();
        assert_eq!(xref.pointer_index('I'), None);
    }

    #[test]
    fn serializes_as_plain_string() {
        let xref = Xref::try_from("@F3@").unwrap();
        let json = serde_json::to_string(&xref).unwrap();
        assert_eq!(json, "\"@F3@\"");
        let back: Xref = serde_json::from_str(&json).unwrap();
        assert_eq!(back, xref);
    }
}
