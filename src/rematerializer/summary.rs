//! Per-key result tracking.

use crate::policy::Strategy;

/// Terminal outcome of processing one archive key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    /// Processing has not reached a terminal state yet.
    NotStarted,
    /// Every member uploaded (and the source was deleted, if configured).
    Completed,
    /// Processing stopped with the given reason; members uploaded before
    /// the failure are NOT rolled back.
    Failed(String),
}

/// Represents what happened to one archive key.
#[derive(Debug, Clone)]
pub struct KeySummary {
    key: String,
    strategy: Option<Strategy>,
    archive_size: u64,
    members_uploaded: usize,
    bytes_uploaded: u64,
    deleted: bool,
    status: KeyStatus,
}

impl KeySummary {
    /// Create a summary for a freshly discovered key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            strategy: None,
            archive_size: 0,
            members_uploaded: 0,
            bytes_uploaded: 0,
            deleted: false,
            status: KeyStatus::NotStarted,
        }
    }

    /// The archive key this summary describes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The materialization strategy chosen for the key, once its size was
    /// evaluated.
    pub fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    /// Size of the archive object in bytes.
    pub fn archive_size(&self) -> u64 {
        self.archive_size
    }

    /// Number of members successfully uploaded.
    pub fn members_uploaded(&self) -> usize {
        self.members_uploaded
    }

    /// Total decompressed bytes uploaded.
    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded
    }

    /// Whether the source archive object was deleted.
    pub fn deleted(&self) -> bool {
        self.deleted
    }

    /// The key's terminal status.
    pub fn status(&self) -> &KeyStatus {
        &self.status
    }

    /// Whether the key completed fully.
    pub fn is_completed(&self) -> bool {
        self.status == KeyStatus::Completed
    }

    pub(crate) fn set_archive_size(&mut self, size: u64) {
        self.archive_size = size;
    }

    pub(crate) fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = Some(strategy);
    }

    pub(crate) fn record_member(&mut self, bytes: u64) {
        self.members_uploaded += 1;
        self.bytes_uploaded += bytes;
    }

    pub(crate) fn set_deleted(&mut self) {
        self.deleted = true;
    }

    /// Mark the key as failed with a reason.
    pub(crate) fn fail(self, reason: impl std::fmt::Display) -> Self {
        Self {
            status: KeyStatus::Failed(reason.to_string()),
            ..self
        }
    }

    /// Mark the key as fully completed.
    pub(crate) fn completed(self) -> Self {
        Self {
            status: KeyStatus::Completed,
            ..self
        }
    }
}
