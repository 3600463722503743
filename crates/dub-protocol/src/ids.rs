use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque job identifier. Always version-4; the UUID crate's `v4` feature
/// guarantees the shape at construction, and `parse` re-validates it for
/// any identifier that arrives over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a job id, rejecting anything that is not UUID-v4 shaped.
    pub fn parse(raw: &str) -> Option<Self> {
        let uuid = Uuid::parse_str(raw).ok()?;
        if uuid.get_version_num() != 4 {
            return None;
        }
        Some(Self(uuid))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        let id = JobId::new();
        let parsed = JobId::parse(&id.to_string()).expect("generated ids always parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_non_v4_and_garbage() {
        assert!(JobId::parse("not-a-uuid").is_none());
        // nil UUID is version 0, not 4.
        assert!(JobId::parse("00000000-0000-0000-0000-000000000000").is_none());
    }
}
