//! Indicatif-backed progress observer.

use crate::progress::{ProgressBarOpts, ProgressObserver};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::sync::Mutex;

/// Renders one progress bar per in-flight member.
///
/// Members upload sequentially, so a single child bar is kept at a time;
/// when progress arrives for a new member the previous bar is finished
/// (and cleared, per the style options) and a fresh one created with the
/// member's declared uncompressed size.
pub struct ProgressDisplay {
    multi: MultiProgress,
    opts: ProgressBarOpts,
    current: Mutex<Option<(String, ProgressBar)>>,
}

impl ProgressDisplay {
    /// Create a display with the given bar style.
    pub fn new(opts: ProgressBarOpts) -> Self {
        let multi = match opts.enabled {
            true => MultiProgress::new(),
            false => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };
        Self {
            multi,
            opts,
            current: Mutex::new(None),
        }
    }

    fn finish_bar(&self, pb: ProgressBar) {
        if self.opts.clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new(ProgressBarOpts::default())
    }
}

impl ProgressObserver for ProgressDisplay {
    fn on_progress(&self, member: &str, transferred: u64, total: u64) {
        // Reporting is best-effort: a poisoned lock drops the update
        // rather than aborting the transfer.
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        match current.as_ref() {
            Some((name, pb)) if name == member => pb.set_position(transferred),
            _ => {
                if let Some((_, pb)) = current.take() {
                    self.finish_bar(pb);
                }
                let pb = self.multi.add(self.opts.clone().to_progress_bar(total));
                pb.set_message(member.to_string());
                pb.set_position(transferred);
                *current = Some((member.to_string(), pb));
            }
        }
    }
}

impl Drop for ProgressDisplay {
    fn drop(&mut self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some((_, pb)) = current.take() {
                if self.opts.clear {
                    pb.finish_and_clear();
                } else {
                    pb.finish();
                }
            }
        }
    }
}
