//! Progress reporting.
//!
//! Uploads report cumulative per-member progress through the narrow
//! [`ProgressObserver`] contract. The observer is invoked synchronously on
//! the upload path, zero or more times per member; when no observer is
//! installed, no progress is computed at all.
//!
//! [`ProgressDisplay`] is the bundled indicatif-backed observer, enabled
//! through [`RematerializerBuilder::verbose`](crate::RematerializerBuilder::verbose).

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::ProgressBarOpts;

/// Receives per-member upload progress.
pub trait ProgressObserver: Send + Sync {
    /// Called as decompressed bytes are handed to the upload transport.
    ///
    /// `transferred` is cumulative for the member and is monotonically
    /// non-decreasing, reaching exactly `total` (the member's declared
    /// uncompressed size) on completion.
    ///
    /// Implementations must not panic: the call sits on the upload path,
    /// and an unwinding observer fails the key it reports on. Handle
    /// internal errors by dropping the update, as [`ProgressDisplay`]
    /// does.
    fn on_progress(&self, member: &str, transferred: u64, total: u64);
}

impl<F> ProgressObserver for F
where
    F: Fn(&str, u64, u64) + Send + Sync,
{
    fn on_progress(&self, member: &str, transferred: u64, total: u64) {
        self(member, transferred, total)
    }
}
