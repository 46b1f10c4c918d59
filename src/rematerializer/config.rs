//! Pipeline configuration and defaults.

use crate::policy::DEFAULT_THRESHOLD;
use crate::progress::ProgressObserver;
use std::sync::Arc;

/// Configuration for the [`Rematerializer`](crate::Rematerializer).
#[derive(Clone)]
pub struct RematerializerConfig {
    /// Boundary between the Buffer and Stream strategies, in bytes.
    /// Objects at or below the threshold are buffered in memory.
    pub threshold: u64,
    /// Key suffix used when discovering archives via listing.
    pub suffix: String,
    /// Container members are uploaded to. `None` uploads back into the
    /// source container.
    pub destination: Option<String>,
    /// Delete the source archive object after all of its members uploaded
    /// successfully. A partially completed archive is never deleted.
    pub delete_source: bool,
    /// Per-member upload progress observer. When absent, no progress is
    /// computed.
    pub observer: Option<Arc<dyn ProgressObserver>>,
}

impl Default for RematerializerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            suffix: ".zip".to_string(),
            destination: None,
            delete_source: false,
            observer: None,
        }
    }
}

impl std::fmt::Debug for RematerializerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RematerializerConfig")
            .field("threshold", &self.threshold)
            .field("suffix", &self.suffix)
            .field("destination", &self.destination)
            .field("delete_source", &self.delete_source)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RematerializerConfig::default();
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.suffix, ".zip");
        assert_eq!(config.destination, None);
        assert!(!config.delete_source);
        assert!(config.observer.is_none());
    }

    #[test]
    fn test_debug_elides_observer() {
        let config = RematerializerConfig {
            observer: Some(Arc::new(|_: &str, _: u64, _: u64| {})),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("observer: true"));
    }
}
