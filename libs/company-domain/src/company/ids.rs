use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::company::error::CompanyError;

/// Unique identifier for a Company
///
/// CompanyId wraps a UUID so company ids cannot be mixed up with other UUIDs
/// in the system. It travels as the canonical hyphenated string and is used
/// as the partition key (raw 16 bytes) on the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(Uuid);

impl CompanyId {
    /// Generate a new time-ordered CompanyId
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a CompanyId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a CompanyId from its canonical string form
    ///
    /// # Errors
    ///
    /// Returns `CompanyError::Validation` if the input is not a UUID
    pub fn parse(input: &str) -> Result<Self, CompanyError> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| CompanyError::validation(format!("invalid company id '{input}'")))
    }

    /// Get the inner UUID value
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Raw bytes of the id, used as the stream partition key
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompanyId {
    type Err = CompanyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for CompanyId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CompanyId> for Uuid {
    fn from(id: CompanyId) -> Self {
        id.0
    }
}

/// Port for identifier generation
///
/// Injected into the lifecycle service so that id assignment can be pinned
/// in tests.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh, never reused identifier
    fn next_id(&self) -> CompanyId;
}

/// Default generator backed by UUID v7
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> CompanyId {
        CompanyId::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_id_generation() {
        let id1 = CompanyId::new();
        let id2 = CompanyId::new();

        assert_ne!(id1, id2, "Each CompanyId should be unique");
    }

    #[test]
    fn test_company_id_display_roundtrips_through_parse() {
        let id = CompanyId::new();
        let display_str = id.to_string();

        assert_eq!(display_str.len(), 36);
        assert_eq!(CompanyId::parse(&display_str).unwrap(), id);
    }

    #[test]
    fn test_company_id_parse_rejects_garbage() {
        let err = CompanyId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, CompanyError::Validation(_)));
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn test_company_id_bytes_match_uuid() {
        let uuid = Uuid::now_v7();
        let id = CompanyId::from_uuid(uuid);
        assert_eq!(id.as_bytes(), uuid.as_bytes());
    }

    #[test]
    fn test_company_id_serializes_as_plain_string() {
        let id = CompanyId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
