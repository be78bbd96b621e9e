use serde::{Deserialize, Serialize};

use crate::domain::Xref;

/// A marriage or partnership and the children recorded under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyUnit {
    /// Stable identifier, unique across the record set.
    pub id: Xref,
    /// The husband, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub husband: Option<Xref>,
    /// The wife, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wife: Option<Xref>,
    /// Children in recorded order. Duplicates are kept as-is.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Xref>,
}

impl FamilyUnit {
    /// Creates a family unit with no members.
    #[must_use]
    pub const fn new(id: Xref) -> Self {
        Self {
            id,
            husband: None,
            wife: None,
            children: Vec::new(),
        }
    }

    /// Whether at least one spouse is recorded.
    #[must_use]
    pub const fn has_spouse(&self) -> bool {
        self.husband.is_some() || self.wife.is_some()
    }

    /// Iterate over the recorded spouses, husband first.
    pub fn spouses(&self) -> impl Iterator<Item = &Xref> {
        self.husband.iter().chain(self.wife.iter())
    }

    /// The other spouse, if `id` is the husband or wife of this unit.
    ///
    /// Returns `None` when `id` is not a spouse here, or when the partner
    /// slot is empty.
    #[must_use]
    pub fn partner_of(&self, id: &Xref) -> Option<&Xref> {
        if self.husband.as_ref() == Some(id) {
            self.wife.as_ref()
        } else if self.wife.as_ref() == Some(id) {
            self.husband.as_ref()
        } else {
            None
        }
    }

    /// Whether `id` occupies the husband or wife slot.
    #[must_use]
    pub fn is_spouse(&self, id: &Xref) -> bool {
        self.husband.as_ref() == Some(id) || self.wife.as_ref() == Some(id)
    }
}
