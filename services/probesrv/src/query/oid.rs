//! Object identifiers addressing values on a remote device

use std::fmt;
use std::str::FromStr;

use errors::{ProbeError, Result};
use serde::{Deserialize, Serialize};

/// Dotted numeric path, stored without a leading dot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Parse a dotted path such as `.1.3.6.1.2.1.1.1.0`
    pub fn new(oid: &str) -> Result<Self> {
        let trimmed = oid.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(ProbeError::invalid_class("empty oid"));
        }
        if trimmed
            .split('.')
            .any(|part| part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(ProbeError::invalid_class(format!("malformed oid '{}'", oid)));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append further components, e.g. a row index
    pub fn child(&self, suffix: &str) -> Result<Self> {
        Self::new(&format!("{}.{}", self.0, suffix.trim_start_matches('.')))
    }

    /// Components of `oid` below this prefix, `None` when `oid` is not underneath it
    pub fn suffix_of<'a>(&self, oid: &'a str) -> Option<Vec<&'a str>> {
        let rest = oid.trim_start_matches('.').strip_prefix(self.0.as_str())?;
        let rest = rest.strip_prefix('.')?;
        Some(rest.split('.').collect())
    }
}

/// Trailing component of a response path as a row index
pub fn row_index(oid: &str) -> Result<u64> {
    let last = oid.rsplit('.').next().unwrap_or_default();
    last.parse::<u64>()
        .map_err(|_| ProbeError::decode(format!("index isn't an integer: '{}'", oid)))
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.0)
    }
}

impl FromStr for Oid {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Oid {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}
