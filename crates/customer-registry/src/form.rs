//! Form fields and the record composition rules.
//!
//! [`FormFields`] is the structured, unsaved side of a customer entry.
//! [`compose`] derives the stored display strings from it and [`decompose`]
//! reads them back when a record is opened for edit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{CustomerRecord, ADDRESS_SEPARATOR, STATE_SEPARATOR};

/// One input of the customer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Given name (may hold several words).
    GivenName,
    /// Surname (a single word).
    Surname,
    /// Phone number.
    Phone,
    /// Postal code (CEP).
    PostalCode,
    /// Street, filled by the postal lookup.
    Street,
    /// Neighborhood, filled by the postal lookup.
    Neighborhood,
    /// City, filled by the postal lookup.
    City,
    /// Two-letter state code, filled by the postal lookup.
    State,
    /// House number.
    Number,
}

impl Field {
    /// Every field, in form order.
    pub const ALL: [Field; 9] = [
        Self::GivenName,
        Self::Surname,
        Self::Phone,
        Self::PostalCode,
        Self::Street,
        Self::Neighborhood,
        Self::City,
        Self::State,
        Self::Number,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GivenName => "given name",
            Self::Surname => "surname",
            Self::Phone => "phone",
            Self::PostalCode => "postal code",
            Self::Street => "street",
            Self::Neighborhood => "neighborhood",
            Self::City => "city",
            Self::State => "state",
            Self::Number => "number",
        }
    }

    /// Must be filled before submit.
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(
            self,
            Self::GivenName | Self::Surname | Self::Phone | Self::PostalCode | Self::Number
        )
    }

    /// Read-only on the form; written by the postal lookup.
    #[must_use]
    pub const fn is_derived(self) -> bool {
        matches!(
            self,
            Self::Street | Self::Neighborhood | Self::City | Self::State
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let field = match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "given" | "givenname" | "name" => Self::GivenName,
            "surname" | "lastname" => Self::Surname,
            "phone" => Self::Phone,
            "postalcode" | "cep" | "zip" => Self::PostalCode,
            "street" => Self::Street,
            "neighborhood" => Self::Neighborhood,
            "city" => Self::City,
            "state" | "uf" => Self::State,
            "number" => Self::Number,
            _ => return Err(format!("unknown field '{s}'")),
        };
        Ok(field)
    }
}

/// Transient form values. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    /// Given name.
    pub given_name: String,
    /// Surname.
    pub surname: String,
    /// Phone number.
    pub phone: String,
    /// Postal code as typed.
    pub postal_code: String,
    /// Street.
    pub street: String,
    /// Neighborhood.
    pub neighborhood: String,
    /// City.
    pub city: String,
    /// State code.
    pub state: String,
    /// House number.
    pub number: String,
}

impl FormFields {
    /// Read one field.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::GivenName => &self.given_name,
            Field::Surname => &self.surname,
            Field::Phone => &self.phone,
            Field::PostalCode => &self.postal_code,
            Field::Street => &self.street,
            Field::Neighborhood => &self.neighborhood,
            Field::City => &self.city,
            Field::State => &self.state,
            Field::Number => &self.number,
        }
    }

    /// Overwrite one field. Surrounding whitespace is dropped.
    pub fn set(&mut self, field: Field, value: &str) {
        let value = value.trim().to_string();
        match field {
            Field::GivenName => self.given_name = value,
            Field::Surname => self.surname = value,
            Field::Phone => self.phone = value,
            Field::PostalCode => self.postal_code = value,
            Field::Street => self.street = value,
            Field::Neighborhood => self.neighborhood = value,
            Field::City => self.city = value,
            Field::State => self.state = value,
            Field::Number => self.number = value,
        }
    }

    /// Labels of required fields that are blank, in form order.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&'static str> {
        Field::ALL
            .into_iter()
            .filter(|field| field.is_required() && self.get(*field).trim().is_empty())
            .map(Field::label)
            .collect()
    }

    /// Check that the form can be submitted.
    ///
    /// Required fields must be filled, and every value must come back
    /// unchanged when the composed record is decomposed again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFields`] or [`Error::AmbiguousField`].
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(Error::MissingFields { fields: missing });
        }

        let record = compose(self);
        let Ok(reread) = decompose(&record) else {
            let (field, value) = self.separator_field().map_or_else(
                || ("address", record.address.clone()),
                |field| (field.label(), self.get(field).to_string()),
            );
            return Err(Error::AmbiguousField { field, value });
        };
        for field in Field::ALL {
            if field == Field::PostalCode {
                continue;
            }
            if reread.get(field) != self.get(field) {
                return Err(Error::AmbiguousField {
                    field: field.label(),
                    value: self.get(field).to_string(),
                });
            }
        }
        Ok(())
    }

    /// First address field holding a separator that splits the address.
    fn separator_field(&self) -> Option<Field> {
        Field::ALL.into_iter().find(|field| {
            let value = self.get(*field);
            match field {
                Field::Street | Field::Number | Field::Neighborhood => {
                    value.contains(ADDRESS_SEPARATOR)
                }
                Field::City | Field::State => {
                    value.contains(ADDRESS_SEPARATOR) || value.contains(STATE_SEPARATOR)
                }
                _ => false,
            }
        })
    }
}

/// Build a record from form fields.
///
/// No validation happens here; see [`FormFields::validate`].
#[must_use]
pub fn compose(fields: &FormFields) -> CustomerRecord {
    CustomerRecord {
        full_name: format!("{} {}", fields.given_name, fields.surname),
        phone: fields.phone.clone(),
        address: format!(
            "{street}{sep}{number}{sep}{neighborhood}{sep}{city}{state_sep}{state}",
            street = fields.street,
            number = fields.number,
            neighborhood = fields.neighborhood,
            city = fields.city,
            state = fields.state,
            sep = ADDRESS_SEPARATOR,
            state_sep = STATE_SEPARATOR,
        ),
    }
}

/// Split a stored record back into form fields.
///
/// The last whitespace-separated token of the name is the surname and the
/// rest is the given name. The postal code is not part of a record and
/// comes back empty.
///
/// # Errors
///
/// Returns [`Error::MalformedRecord`] when the address is not exactly
/// `street, number, neighborhood, city - state`.
pub fn decompose(record: &CustomerRecord) -> Result<FormFields> {
    let mut tokens: Vec<&str> = record.full_name.split_whitespace().collect();
    let surname = tokens.pop().unwrap_or_default().to_string();
    let given_name = tokens.join(" ");

    let parts: Vec<&str> = record.address.split(ADDRESS_SEPARATOR).collect();
    let [street, number, neighborhood, city_state] = parts.as_slice() else {
        return Err(Error::malformed_record(format!(
            "address has {} parts separated by {ADDRESS_SEPARATOR:?}, expected 4",
            parts.len()
        )));
    };

    let city_and_state: Vec<&str> = city_state.split(STATE_SEPARATOR).collect();
    let [city, state] = city_and_state.as_slice() else {
        return Err(Error::malformed_record(format!(
            "city and state {city_state:?} are not separated by a single {STATE_SEPARATOR:?}"
        )));
    };

    Ok(FormFields {
        given_name,
        surname,
        phone: record.phone.clone(),
        postal_code: String::new(),
        street: (*street).to_string(),
        neighborhood: (*neighborhood).to_string(),
        city: (*city).to_string(),
        state: (*state).to_string(),
        number: (*number).to_string(),
    })
}

/// The all-empty field set.
#[must_use]
pub fn clear() -> FormFields {
    FormFields::default()
}
