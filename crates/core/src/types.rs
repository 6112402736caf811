/// Scenes are keyed by random UUIDs assigned when segmentation output is
/// turned into records.
pub type SceneId = uuid::Uuid;

/// Identifier of one storyboard generation run.
pub type RunId = uuid::Uuid;

/// Identifier of one transcript entry.
pub type MessageId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
