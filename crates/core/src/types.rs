/// All entity identifiers are BIGSERIAL-style integers, allocated per
/// tree by [`crate::template::RequirementTree`].
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
