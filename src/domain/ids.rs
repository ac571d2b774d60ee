//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that flow through an extraction run.
//! Each type keeps scan ids, tenant ids and pagination cursors from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scan identifier newtype wrapper
///
/// Identifies one logical extraction run. Pause/cancel predicates and the
/// checkpoint sink are keyed by this value.
///
/// # Examples
///
/// ```
/// use deal_etl::domain::ids::ScanId;
/// use std::str::FromStr;
///
/// let scan_id = ScanId::from_str("scan-2024-01-15").unwrap();
/// assert_eq!(scan_id.as_str(), "scan-2024-01-15");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(String);

impl ScanId {
    /// Creates a new ScanId from a string
    ///
    /// Scan ids are used as file names by the checkpoint store, so path
    /// separators are rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Scan ID cannot be empty".to_string());
        }
        if id.contains('/') || id.contains('\\') || id == "." || id == ".." {
            return Err(format!("Scan ID contains invalid characters: {id}"));
        }
        Ok(Self(id))
    }

    /// Returns the scan ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScanId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ScanId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Tenant identifier newtype wrapper
///
/// Stamped on every transformed deal; not interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new TenantId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Tenant ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the tenant ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Opaque pagination cursor issued by the CRM
///
/// The value is never inspected; it is only echoed back as the `after`
/// query parameter. An absent cursor (`Option::None`) means "start" when
/// requesting and "no more pages" when returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a cursor string as returned by the API
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the cursor as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_id_valid() {
        let id = ScanId::new("scan-123").unwrap();
        assert_eq!(id.as_str(), "scan-123");
        assert_eq!(id.to_string(), "scan-123");
    }

    #[test]
    fn test_scan_id_rejects_empty_and_paths() {
        assert!(ScanId::new("").is_err());
        assert!(ScanId::new("   ").is_err());
        assert!(ScanId::new("../etc").is_err());
        assert!(ScanId::new("a\\b").is_err());
        assert!(ScanId::new("..").is_err());
    }

    #[test]
    fn test_tenant_id_rejects_empty() {
        assert!(TenantId::new("").is_err());
        assert_eq!(TenantId::new("org-1").unwrap().as_str(), "org-1");
    }

    #[test]
    fn test_cursor_serializes_as_plain_string() {
        let cursor = Cursor::new("NTI1Cg%3D%3D");
        let json = serde_json::to_string(&cursor).unwrap();
        assert_eq!(json, "\"NTI1Cg%3D%3D\"");

        let back: Cursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);
    }
}
