//! `customer-registry` - A small local customer registry with postal-code address lookup
//!
//! This library keeps a list of customers (full name, phone, address) in a
//! local database, and provides the form session used to create and edit
//! them, including address completion from a Brazilian postal code (CEP).

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod lookup;
pub mod record;
pub mod registry;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use form::{Field, FormFields};
pub use logging::init_logging;
pub use lookup::{PostalCode, PostalLookup, ViaCepClient};
pub use record::CustomerRecord;
pub use registry::Registry;
pub use session::{EditMode, FormSession};
pub use storage::{Storage, StorageStats};
