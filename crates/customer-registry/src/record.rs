//! Customer record type.
//!
//! A [`CustomerRecord`] is what the registry stores and lists. Its name and
//! address are composite strings built by [`crate::form::compose`]; the
//! field names on the wire are `fullName`, `phone` and `address`.

use serde::{Deserialize, Serialize};

/// Separator between the address parts.
pub const ADDRESS_SEPARATOR: &str = ", ";

/// Separator between city and state code.
pub const STATE_SEPARATOR: &str = " - ";

/// A stored customer entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    /// Given name and surname, single-space separated.
    pub full_name: String,

    /// Phone number, stored as typed.
    pub phone: String,

    /// `street, number, neighborhood, city - state`.
    pub address: String,
}

impl CustomerRecord {
    /// Create a record from its three display strings.
    #[must_use]
    pub fn new(
        full_name: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            phone: phone.into(),
            address: address.into(),
        }
    }

    /// Check whether the full name contains `needle`, ignoring case.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn name_contains(&self, needle: &str) -> bool {
        self.full_name.to_lowercase().contains(needle)
    }
}
