use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Xref;

/// A person in the record set.
///
/// Links to family units are stored on the individual as ordered lists of
/// family ids. They are maintained by
/// [`RecordSet::upsert_family`](crate::RecordSet::upsert_family) or taken
/// verbatim from an imported file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    /// Stable identifier, unique across the record set.
    pub id: Xref,
    /// Display name, without surname delimiters.
    #[serde(default)]
    pub name: String,
    /// Recorded sex, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Free-text birth date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    /// Free-text place of residence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residence: Option<String>,
    /// Free-text occupation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    /// Family units in which this individual is a husband or wife.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spousal_links: Vec<Xref>,
    /// Family units in which this individual is a child.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_links: Vec<Xref>,
}

impl Individual {
    /// Creates an individual with the given id and every other field empty.
    #[must_use]
    pub const fn new(id: Xref) -> Self {
        Self {
            id,
            name: String::new(),
            sex: None,
            birth_date: None,
            residence: None,
            occupation: None,
            spousal_links: Vec::new(),
            child_links: Vec::new(),
        }
    }

    /// Whether this individual has no parent family, making them a root of
    /// the descendant forest.
    #[must_use]
    pub fn is_founder(&self) -> bool {
        self.child_links.is_empty()
    }

    /// The name to show for this individual, falling back to the id when no
    /// name has been recorded.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    /// Case-insensitive substring match against the name and occupation.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self
                .occupation
                .as_deref()
                .is_some_and(|occupation| occupation.to_lowercase().contains(&term))
    }
}

/// Sex of an individual.
///
/// Only `M` and `F` are interpreted. Any other token is kept verbatim so that
/// it survives a round trip through the interchange format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sex {
    /// `M`
    Male,
    /// `F`
    Female,
    /// Any other recorded value.
    Other(String),
}

impl Sex {
    /// The interchange-format token for this value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for Sex {
    fn from(value: &str) -> Self {
        match value {
            "M" => Self::Male,
            "F" => Self::Female,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Sex {
    fn from(value: String) -> Self {
        match value.as_str() {
            "M" => Self::Male,
            "F" => Self::Female,
            _ => Self::Other(value),
        }
    }
}

impl From<Sex> for String {
    fn from(sex: Sex) -> Self {
        match sex {
            Sex::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str, occupation: Option<&str>) -> Individual {
        let mut individual = Individual::new("@I1@".parse().unwrap());
        individual.name = name.to_string();
        individual.occupation = occupation.map(str::to_string);
        individual
    }

    #[test]
    fn search_is_case_insensitive() {
        let individual = person("Ada Lovelace", Some("Mathematician"));
        assert!(individual.matches("lovelace"));
        assert!(individual.matches("MATH"));
        assert!(!individual.matches("babbage"));
    }

    #[test]
    fn search_tolerates_missing_occupation() {
        let individual = person("Ada Lovelace", None);
        assert!(!individual.matches("math"));
        assert!(individual.matches(""));
    }

    #[test]
    fn unknown_sex_is_preserved() {
        let sex = Sex::from("U");
        assert_eq!(sex, Sex::Other("U".to_string()));
        assert_eq!(sex.as_str(), "U");
        assert_eq!(Sex::from("F"), Sex::Female);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let individual = person("", None);
        assert_eq!(individual.display_name(), "@I1@");
    }
}
