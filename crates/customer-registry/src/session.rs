//! Form session: unsaved field values plus the edit-mode toggle.
//!
//! A [`FormSession`] is what sits between the interactive surface and the
//! [`Registry`]. It owns the form, decides whether submit creates or
//! replaces a record, and applies postal lookup results to the address
//! fields.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::form::{self, Field, FormFields};
use crate::lookup::{LookupError, LookupOutcome, PostalCode, PostalLookup};
use crate::record::CustomerRecord;
use crate::registry::Registry;

/// Whether submit creates a record or replaces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Submit appends a new record.
    #[default]
    Idle,
    /// Submit replaces the record at this index.
    Editing(usize),
}

impl EditMode {
    /// Index being edited, if any.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Editing(index) => Some(index),
        }
    }

    /// Label for the submit action.
    #[must_use]
    pub const fn submit_label(self) -> &'static str {
        match self {
            Self::Idle => "Save",
            Self::Editing(_) => "Update",
        }
    }
}

/// Asks the user a yes/no question.
pub trait Confirm {
    /// Return `true` to go ahead.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// What a successful submit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Index of the saved record.
    pub index: usize,
    /// `true` if the record was appended, `false` if it replaced one.
    pub created: bool,
    /// The saved record.
    pub record: CustomerRecord,
}

/// What a remove request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The user declined; nothing changed.
    Declined,
    /// The record was removed.
    Removed {
        /// The removed record.
        record: CustomerRecord,
        /// Whether the edit session on that record was cancelled.
        cancelled_edit: bool,
    },
}

/// Tag tying a lookup to the postal code that started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    code: PostalCode,
}

impl LookupTicket {
    /// The code being looked up.
    #[must_use]
    pub fn code(&self) -> &PostalCode {
        &self.code
    }
}

/// User-facing result of a postal lookup. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupNotice {
    /// The postal code field did not hold 8 digits; nothing was requested.
    Skipped,
    /// Address fields were filled.
    Filled,
    /// The service does not know the code; address fields are unchanged.
    NotFound,
    /// The request failed; address fields are unchanged.
    Failed(String),
    /// The postal code changed while the request was in flight; the answer
    /// was discarded.
    Stale,
}

/// Transient form state and edit mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSession {
    fields: FormFields,
    mode: EditMode,
}

impl FormSession {
    /// Start with an empty form in idle mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current field values.
    #[must_use]
    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    /// Current edit mode.
    #[must_use]
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Overwrite one field.
    pub fn set(&mut self, field: Field, value: &str) {
        self.fields.set(field, value);
    }

    /// Empty every field. The edit mode is kept.
    pub fn clear(&mut self) {
        self.fields = form::clear();
    }

    /// Leave edit mode and empty the form.
    pub fn cancel_edit(&mut self) {
        self.fields = form::clear();
        self.mode = EditMode::Idle;
    }

    /// Load the record at `index` into the form and switch to editing it.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or the record cannot be
    /// decomposed; the session is unchanged in that case.
    pub fn open_for_edit(&mut self, registry: &Registry, index: usize) -> Result<()> {
        let fields = form::decompose(registry.get(index)?)?;
        self.fields = fields;
        self.mode = EditMode::Editing(index);
        debug!("Editing record {index}");
        Ok(())
    }

    /// Validate the form, then create or replace a record.
    ///
    /// On success the form is emptied and the session returns to idle.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the registry write fails; the form
    /// and edit mode are kept so the user can correct them.
    pub fn submit(&mut self, registry: &mut Registry) -> Result<SubmitOutcome> {
        self.fields.validate()?;

        let record = form::compose(&self.fields);
        let target = self.mode.index();
        registry.upsert(target, record.clone())?;

        let outcome = SubmitOutcome {
            index: target.unwrap_or(registry.len() - 1),
            created: target.is_none(),
            record,
        };
        self.cancel_edit();
        Ok(outcome)
    }

    /// Remove the record at `index` once `confirm` agrees.
    ///
    /// Removing the record being edited cancels the edit; removing one
    /// before it shifts the edit index so it keeps pointing at the same
    /// record.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or the registry write
    /// fails.
    pub fn remove(
        &mut self,
        registry: &mut Registry,
        index: usize,
        confirm: &mut impl Confirm,
    ) -> Result<RemoveOutcome> {
        let name = registry.get(index)?.full_name.clone();
        if !confirm.confirm(&format!("Remove customer '{name}'?")) {
            debug!("Removal of record {index} declined");
            return Ok(RemoveOutcome::Declined);
        }

        let record = registry.remove_at(index)?;

        let mut cancelled_edit = false;
        match self.mode {
            EditMode::Editing(editing) if editing == index => {
                self.cancel_edit();
                cancelled_edit = true;
                info!("Cancelled edit of removed record {index}");
            }
            EditMode::Editing(editing) if editing > index => {
                self.mode = EditMode::Editing(editing - 1);
            }
            _ => {}
        }

        Ok(RemoveOutcome::Removed {
            record,
            cancelled_edit,
        })
    }

    /// Tag a lookup for the current postal code.
    ///
    /// Returns `None` unless the field holds exactly 8 digits once other
    /// characters are stripped.
    #[must_use]
    pub fn begin_lookup(&self) -> Option<LookupTicket> {
        PostalCode::parse(&self.fields.postal_code).map(|code| LookupTicket { code })
    }

    /// Apply the answer to a lookup started with [`Self::begin_lookup`].
    ///
    /// Address fields change only on success and only if the postal code
    /// still matches the ticket.
    pub fn apply_lookup(
        &mut self,
        ticket: &LookupTicket,
        result: std::result::Result<LookupOutcome, LookupError>,
    ) -> LookupNotice {
        if PostalCode::parse(&self.fields.postal_code).as_ref() != Some(&ticket.code) {
            warn!(cep = %ticket.code, "Discarding stale postal lookup answer");
            return LookupNotice::Stale;
        }

        match result {
            Ok(LookupOutcome::Found(fragment)) => {
                self.fields.street = fragment.street;
                self.fields.neighborhood = fragment.neighborhood;
                self.fields.city = fragment.city;
                self.fields.state = fragment.state_code;
                LookupNotice::Filled
            }
            Ok(LookupOutcome::NotFound) => {
                info!(cep = %ticket.code, "Postal code not found");
                LookupNotice::NotFound
            }
            Err(e) => {
                warn!(cep = %ticket.code, "Postal lookup failed: {e}");
                LookupNotice::Failed(e.to_string())
            }
        }
    }

    /// The postal code field lost focus: look it up and fill the address.
    pub async fn blur_postal_code(&mut self, lookup: &dyn PostalLookup) -> LookupNotice {
        let Some(ticket) = self.begin_lookup() else {
            return LookupNotice::Skipped;
        };
        let result = lookup.lookup(ticket.code()).await;
        self.apply_lookup(&ticket, result)
    }
}
