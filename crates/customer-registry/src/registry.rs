//! The customer registry store.
//!
//! The free functions ([`filter`], [`upsert`], [`remove_at`]) are pure: they
//! take a record list and return a new one. [`Registry`] owns the live list
//! and is the only thing that writes it to storage.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::CustomerRecord;
use crate::storage::Storage;

/// Read the record list stored under `key`.
///
/// A missing slot, an unreadable database, or a blob that is not a JSON
/// array of records all yield an empty list.
#[must_use]
pub fn load(storage: &Storage, key: &str) -> Vec<CustomerRecord> {
    let blob = match storage.read_slot(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            debug!("No records stored under {key}");
            return Vec::new();
        }
        Err(e) => {
            warn!("Could not read records under {key}, starting empty: {e}");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<CustomerRecord>>(&blob) {
        Ok(records) => {
            debug!("Loaded {} records from {key}", records.len());
            records
        }
        Err(e) => {
            warn!("Stored records under {key} are malformed, starting empty: {e}");
            Vec::new()
        }
    }
}

/// Serialize `records` and overwrite the slot under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the database write fails.
pub fn save(storage: &Storage, key: &str, records: &[CustomerRecord]) -> Result<()> {
    let blob = serde_json::to_string(records)?;
    storage.write_slot(key, &blob)?;
    Ok(())
}

/// Records whose full name contains `query`, ignoring case.
///
/// An empty query returns every record in order.
#[must_use]
pub fn filter(records: &[CustomerRecord], query: &str) -> Vec<CustomerRecord> {
    filter_indexed(records, query)
        .into_iter()
        .map(|(_, record)| record.clone())
        .collect()
}

/// Like [`filter`], keeping each record's position in `records`.
#[must_use]
pub fn filter_indexed<'a>(
    records: &'a [CustomerRecord],
    query: &str,
) -> Vec<(usize, &'a CustomerRecord)> {
    let needle = query.to_lowercase();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.name_contains(&needle))
        .collect()
}

/// Append `record`, or replace the one at `index`.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfRange`] if `index` is past the end.
pub fn upsert(
    records: &[CustomerRecord],
    index: Option<usize>,
    record: CustomerRecord,
) -> Result<Vec<CustomerRecord>> {
    let mut next = records.to_vec();
    match index {
        None => next.push(record),
        Some(index) => {
            let slot = next.get_mut(index).ok_or(Error::IndexOutOfRange {
                index,
                len: records.len(),
            })?;
            *slot = record;
        }
    }
    Ok(next)
}

/// The list without the record at `index`.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfRange`] if `index` is past the end.
pub fn remove_at(records: &[CustomerRecord], index: usize) -> Result<Vec<CustomerRecord>> {
    if index >= records.len() {
        return Err(Error::IndexOutOfRange {
            index,
            len: records.len(),
        });
    }
    Ok(records
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, record)| record.clone())
        .collect())
}

/// The live record list bound to its storage slot.
///
/// Every mutation builds a new list, persists it, and only then replaces
/// the in-memory copy.
#[derive(Debug)]
pub struct Registry {
    storage: Storage,
    key: String,
    records: Vec<CustomerRecord>,
}

impl Registry {
    /// Load the records stored under `key`.
    #[must_use]
    pub fn open(storage: Storage, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = load(&storage, &key);
        info!("Registry opened with {} records", records.len());
        Self {
            storage,
            key,
            records,
        }
    }

    /// All records in display order.
    #[must_use]
    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    /// The record at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is past the end.
    pub fn get(&self, index: usize) -> Result<&CustomerRecord> {
        self.records.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records matching `query` with their indices in the full list.
    #[must_use]
    pub fn filtered(&self, query: &str) -> Vec<(usize, &CustomerRecord)> {
        filter_indexed(&self.records, query)
    }

    /// Append a record, or replace the one at `index`, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or the write fails; the
    /// in-memory list is left untouched in both cases.
    pub fn upsert(&mut self, index: Option<usize>, record: CustomerRecord) -> Result<()> {
        let next = upsert(&self.records, index, record)?;
        self.commit(next)?;
        match index {
            Some(index) => info!("Updated record {index}"),
            None => info!("Added record {}", self.records.len() - 1),
        }
        Ok(())
    }

    /// Remove the record at `index` and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or the write fails.
    pub fn remove_at(&mut self, index: usize) -> Result<CustomerRecord> {
        let removed = self.get(index)?.clone();
        let next = remove_at(&self.records, index)?;
        self.commit(next)?;
        info!("Removed record {index}");
        Ok(removed)
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Key of the slot holding the records.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn commit(&mut self, next: Vec<CustomerRecord>) -> Result<()> {
        save(&self.storage, &self.key, &next)?;
        self.records = next;
        Ok(())
    }
}
