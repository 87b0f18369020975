use std::time::Duration;

use tracing::debug;
use web_time::Instant;

use super::{Bba2Options, QualityLevel, Zone};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AbrReason {
    Emergency,
    Startup,
    Ramp,
    Steady,
    Full,
    /// Upgrade recommended but the current level has not been held long enough.
    DwellPending,
    SeekDrop,
    SeekPending,
    SeekRestore,
    Manual,
    AlreadyOptimal,
}

impl AbrReason {
    fn for_zone(zone: Zone) -> Self {
        match zone {
            Zone::Emergency => Self::Emergency,
            Zone::Startup => Self::Startup,
            Zone::Ramp => Self::Ramp,
            Zone::Steady => Self::Steady,
            Zone::Full => Self::Full,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AbrDecision {
    pub target_level: usize,
    pub reason: AbrReason,
    pub changed: bool,
}

/// Mutable algorithm state, exposed read-only for diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct Bba2State {
    pub current_level: usize,
    pub current_zone: Zone,
    pub buffer_length: f64,
    pub dwell_start: Instant,
    pub last_quality_change: Option<Instant>,
    pub seek_pending: bool,
    /// Set only while `seek_pending` is true.
    pub pre_seek_level: Option<usize>,
}

/// Buffer-based bitrate selection (BBA-2).
///
/// One controller per media source. Starts at the lowest level in the
/// EMERGENCY zone and is driven exclusively through [`Bba2Controller::update`].
#[derive(Clone, Debug)]
pub struct Bba2Controller {
    cfg: Bba2Options,
    levels: Vec<QualityLevel>,
    state: Bba2State,
}

impl Bba2Controller {
    #[must_use]
    pub fn new(cfg: Bba2Options, levels: Vec<QualityLevel>) -> Self {
        Self::new_at(cfg, levels, Instant::now())
    }

    /// Create a controller whose dwell timer starts at `now`.
    #[must_use]
    pub fn new_at(cfg: Bba2Options, levels: Vec<QualityLevel>, now: Instant) -> Self {
        if !cfg.is_valid() {
            debug!(?cfg, "BBA-2 options are degenerate, STEADY zone will hold level");
        }
        Self {
            cfg,
            levels,
            state: Bba2State {
                current_level: 0,
                current_zone: Zone::Emergency,
                buffer_length: 0.0,
                dwell_start: now,
                last_quality_change: None,
                seek_pending: false,
                pre_seek_level: None,
            },
        }
    }

    #[must_use]
    pub fn options(&self) -> &Bba2Options {
        &self.cfg
    }

    #[must_use]
    pub fn levels(&self) -> &[QualityLevel] {
        &self.levels
    }

    #[must_use]
    pub fn state(&self) -> &Bba2State {
        &self.state
    }

    #[must_use]
    pub fn current_level(&self) -> usize {
        self.state.current_level
    }

    #[must_use]
    pub fn max_level(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Move to `level` outside of zone logic (e.g. after a manual pin is released).
    pub fn set_current_level(&mut self, level: usize, now: Instant) {
        let level = level.min(self.max_level());
        self.apply(level, now);
    }

    /// Feed the latest buffer observation and return the level to play.
    pub fn update(&mut self, buffer_secs: f64, seek_pending: bool, now: Instant) -> AbrDecision {
        // Garbage readings count as an empty buffer.
        let buffer_secs = if buffer_secs.is_finite() {
            buffer_secs.max(0.0)
        } else {
            0.0
        };
        self.state.buffer_length = buffer_secs;
        let current = self.state.current_level;

        match (self.state.seek_pending, seek_pending) {
            (false, true) => {
                self.state.seek_pending = true;
                self.state.pre_seek_level = Some(current);
                let target = current.saturating_sub(1);
                debug!(from = current, to = target, "BBA-2: seek started, dropping one level");
                return self.transition(target, AbrReason::SeekDrop, now);
            }
            (true, true) => {
                return AbrDecision {
                    target_level: current,
                    reason: AbrReason::SeekPending,
                    changed: false,
                };
            }
            (true, false) => {
                self.state.seek_pending = false;
                let restored = self
                    .state
                    .pre_seek_level
                    .take()
                    .map_or(current, |level| level.min(self.max_level()));
                debug!(from = current, to = restored, "BBA-2: seek resolved, restoring level");
                return self.transition(restored, AbrReason::SeekRestore, now);
            }
            (false, false) => {}
        }

        let zone = self.cfg.classify(buffer_secs);
        if zone != self.state.current_zone {
            debug!(from = ?self.state.current_zone, to = ?zone, buffer_secs, "BBA-2: zone change");
            self.state.current_zone = zone;
        }

        let max_level = self.max_level();
        let target = match zone {
            Zone::Emergency => 0,
            Zone::Startup => (current + 1).min(2).min(max_level),
            Zone::Ramp => (current + 2).min(max_level),
            Zone::Steady => self.steady_level(buffer_secs),
            Zone::Full => max_level,
        };
        let reason = AbrReason::for_zone(zone);

        // Downgrades apply at once; every upgrade waits for dwell.
        if target > current && !self.dwell_elapsed(now) {
            debug!(
                current,
                target,
                ?zone,
                dwell_secs = self.dwell(now).as_secs_f64(),
                "BBA-2: upgrade suppressed until dwell expires"
            );
            return AbrDecision {
                target_level: current,
                reason: AbrReason::DwellPending,
                changed: false,
            };
        }

        self.transition(target, reason, now)
    }

    /// Proportional level inside STEADY.
    ///
    /// Rounds to the nearest level, which can pick one step above what the
    /// buffer strictly supports.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "level counts are tiny and the ratio is clamped to [0, 1]"
    )]
    fn steady_level(&self, buffer_secs: f64) -> usize {
        let max_level = self.max_level();
        if max_level == 0 {
            return 0;
        }
        let span = self.cfg.target_buffer_secs - self.cfg.ramp_below_secs;
        if span.is_nan() || span <= 0.0 {
            return self.state.current_level;
        }
        let ratio = ((buffer_secs - self.cfg.ramp_below_secs) / span).clamp(0.0, 1.0);
        ((ratio * max_level as f64).round() as usize).min(max_level)
    }

    fn dwell(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state.dwell_start)
    }

    fn dwell_elapsed(&self, now: Instant) -> bool {
        self.dwell(now) >= self.cfg.min_dwell
    }

    fn transition(&mut self, target: usize, reason: AbrReason, now: Instant) -> AbrDecision {
        let current = self.state.current_level;
        if target == current {
            let reason = match reason {
                AbrReason::SeekDrop | AbrReason::SeekRestore => reason,
                _ => AbrReason::AlreadyOptimal,
            };
            return AbrDecision {
                target_level: current,
                reason,
                changed: false,
            };
        }

        self.apply(target, now);
        debug!(from = current, to = target, ?reason, "BBA-2: level applied");
        AbrDecision {
            target_level: target,
            reason,
            changed: true,
        }
    }

    fn apply(&mut self, level: usize, now: Instant) {
        if level == self.state.current_level {
            return;
        }
        self.state.current_level = level;
        self.state.last_quality_change = Some(now);
        self.state.dwell_start = now;
    }
}
