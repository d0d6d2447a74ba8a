//! Postal code (CEP) lookup.
//!
//! Resolves an 8-digit Brazilian postal code to the street, neighborhood,
//! city and state it belongs to. The [`PostalLookup`] trait is the seam the
//! form session depends on; [`ViaCepClient`] is the HTTP implementation.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::{LookupConfig, POSTAL_CODE_PLACEHOLDER};

/// Errors that can occur while talking to the lookup service.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON.
    #[error("unreadable response: {0}")]
    Response(String),
}

/// A postal code reduced to its 8 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Number of digits in a postal code.
    pub const LEN: usize = 8;

    /// Strip everything but digits; `None` unless exactly 8 remain.
    ///
    /// ```
    /// use customer_registry::lookup::PostalCode;
    ///
    /// assert_eq!(PostalCode::parse("01001-000").unwrap().as_str(), "01001000");
    /// assert!(PostalCode::parse("0100100").is_none());
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        (digits.len() == Self::LEN).then_some(Self(digits))
    }

    /// The 8 digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address parts returned for a postal code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFragment {
    /// Street (`logradouro`).
    pub street: String,
    /// Neighborhood (`bairro`).
    pub neighborhood: String,
    /// City (`localidade`).
    pub city: String,
    /// State code (`uf`).
    pub state_code: String,
}

/// Result of a completed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The code exists.
    Found(AddressFragment),
    /// The service does not know the code.
    NotFound,
}

/// An address-completion service.
#[async_trait::async_trait]
pub trait PostalLookup: Send + Sync {
    /// Resolve `code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or its answer
    /// cannot be read. An unknown code is not an error.
    async fn lookup(&self, code: &PostalCode) -> Result<LookupOutcome, LookupError>;
}

/// JSON body returned by ViaCEP.
///
/// Missing data fields come back empty. `erro` has been sent both as a
/// boolean and as the string `"true"`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViaCepResponse {
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    erro: Option<ErrorFlag>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorFlag {
    Bool(bool),
    Text(String),
}

impl ErrorFlag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(flag) => *flag,
            Self::Text(text) => text.eq_ignore_ascii_case("true"),
        }
    }
}

impl ViaCepResponse {
    /// Interpret the body as a lookup outcome.
    #[must_use]
    pub fn into_outcome(self) -> LookupOutcome {
        if self.erro.as_ref().is_some_and(ErrorFlag::is_set) {
            return LookupOutcome::NotFound;
        }
        LookupOutcome::Found(AddressFragment {
            street: self.logradouro.unwrap_or_default(),
            neighborhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            state_code: self.uf.unwrap_or_default(),
        })
    }
}

/// HTTP client for the ViaCEP service.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    client: reqwest::Client,
    /// Endpoint template containing `{cep}`.
    endpoint: String,
}

impl ViaCepClient {
    /// Create a client for the given endpoint template.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, LookupError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Create a client from the lookup section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: &LookupConfig) -> Result<Self, LookupError> {
        Self::new(config.endpoint.clone(), config.timeout())
    }

    /// The request URL for `code`.
    #[must_use]
    pub fn url_for(&self, code: &PostalCode) -> String {
        self.endpoint.replace(POSTAL_CODE_PLACEHOLDER, code.as_str())
    }
}

#[async_trait::async_trait]
impl PostalLookup for ViaCepClient {
    #[instrument(skip(self), fields(cep = %code))]
    async fn lookup(&self, code: &PostalCode) -> Result<LookupOutcome, LookupError> {
        let url = self.url_for(code);
        debug!(url = %url, "Requesting postal code");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Postal lookup returned an error status");
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: ViaCepResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Response(e.to_string()))?;

        let outcome = body.into_outcome();
        debug!(found = matches!(outcome, LookupOutcome::Found(_)), "Postal lookup answered");
        Ok(outcome)
    }
}
