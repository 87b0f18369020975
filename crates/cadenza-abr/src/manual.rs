use tracing::{debug, info};

use super::AbrMode;

/// Stalls tolerated at a pinned level before falling back to [`AbrMode::Auto`].
pub const DEFAULT_STALL_THRESHOLD: u32 = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StallVerdict {
    /// Not pinned; stalls are the algorithm's business.
    Ignored,
    /// Pinned; stall recorded.
    Counted(u32),
    /// Threshold reached; the pin was released.
    Reverted,
}

/// Viewer-selected quality pin with stall-triggered auto revert.
#[derive(Clone, Debug)]
pub struct ManualOverride {
    mode: AbrMode,
    stall_count: u32,
    stall_threshold: u32,
}

impl Default for ManualOverride {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_THRESHOLD)
    }
}

impl ManualOverride {
    #[must_use]
    pub fn new(stall_threshold: u32) -> Self {
        Self {
            mode: AbrMode::Auto,
            stall_count: 0,
            stall_threshold: stall_threshold.max(1),
        }
    }

    #[must_use]
    pub fn mode(&self) -> AbrMode {
        self.mode
    }

    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.mode.is_auto()
    }

    #[must_use]
    pub fn stall_count(&self) -> u32 {
        self.stall_count
    }

    /// Pin a level or release the pin. Always resets the stall counter.
    pub fn select(&mut self, mode: AbrMode) {
        debug!(from = ?self.mode, to = ?mode, "quality selection");
        self.mode = mode;
        self.stall_count = 0;
    }

    /// Record a media stall.
    pub fn on_stall(&mut self) -> StallVerdict {
        let AbrMode::Manual(level) = self.mode else {
            return StallVerdict::Ignored;
        };

        self.stall_count += 1;
        if self.stall_count < self.stall_threshold {
            debug!(level, stalls = self.stall_count, "stall at pinned level");
            return StallVerdict::Counted(self.stall_count);
        }

        info!(
            level,
            stalls = self.stall_count,
            "pinned level keeps stalling, returning to auto"
        );
        self.mode = AbrMode::Auto;
        self.stall_count = 0;
        StallVerdict::Reverted
    }
}
