//! Size-threshold strategy decision.
//!
//! Before any archive bytes are touched, one of two materialization
//! strategies is chosen from the object's size alone: small archives are
//! pulled into memory whole, large ones are read incrementally through
//! byte-range requests.

/// Default boundary between buffering and streaming: 1 GiB.
pub const DEFAULT_THRESHOLD: u64 = 1_073_741_824;

/// How an archive object's bytes are materialized for reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch the whole object into memory first.
    Buffer,
    /// Read incrementally via byte-range requests.
    Stream,
}

/// Select a strategy for one archive object.
///
/// Sizes at or below the threshold buffer; the tie goes to [`Strategy::Buffer`]
/// since an object exactly at the threshold still fits in memory by the
/// threshold's own definition. Pure and total: no error conditions, no side
/// effects.
pub fn decide(object_size: u64, threshold: u64) -> Strategy {
    if object_size <= threshold {
        Strategy::Buffer
    } else {
        Strategy::Stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_buffers() {
        assert_eq!(decide(0, DEFAULT_THRESHOLD), Strategy::Buffer);
        assert_eq!(decide(500 << 20, 1 << 30), Strategy::Buffer);
        assert_eq!(decide(DEFAULT_THRESHOLD - 1, DEFAULT_THRESHOLD), Strategy::Buffer);
    }

    #[test]
    fn test_above_threshold_streams() {
        assert_eq!(decide(2 << 30, 1 << 30), Strategy::Stream);
        assert_eq!(decide(DEFAULT_THRESHOLD + 1, DEFAULT_THRESHOLD), Strategy::Stream);
        assert_eq!(decide(u64::MAX, DEFAULT_THRESHOLD), Strategy::Stream);
    }

    #[test]
    fn test_equal_size_buffers() {
        // Documented tie-break: equality routes to Buffer.
        assert_eq!(decide(DEFAULT_THRESHOLD, DEFAULT_THRESHOLD), Strategy::Buffer);
        assert_eq!(decide(0, 0), Strategy::Buffer);
    }
}
