//! Wires the BBA-2 controller and the manual override onto a delivery client.

use std::sync::Arc;

use cadenza_abr::{
    AbrDecision, AbrMode, Bba2Controller, Bba2Options, ManualOverride, QualityLevel, StallVerdict,
};
use cadenza_events::ErrorRecord;
use tracing::{debug, info};
use web_time::Instant;

use crate::traits::delivery::{DeliveryClient, LevelSelection};

/// Quality selection for one player instance.
///
/// Every operation is absorbed while no delivery client is attached.
pub struct QualityController {
    options: Bba2Options,
    abr: Option<Bba2Controller>,
    manual: ManualOverride,
    client: Option<Arc<dyn DeliveryClient>>,
}

impl std::fmt::Debug for QualityController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityController")
            .field("abr", &self.abr)
            .field("manual", &self.manual)
            .field("attached", &self.client.is_some())
            .finish_non_exhaustive()
    }
}

impl QualityController {
    #[must_use]
    pub fn new(options: Bba2Options, stall_threshold: u32) -> Self {
        Self {
            options,
            abr: None,
            manual: ManualOverride::new(stall_threshold),
            client: None,
        }
    }

    pub fn attach(&mut self, client: Arc<dyn DeliveryClient>) {
        self.client = Some(client);
    }

    pub fn detach(&mut self) -> Option<Arc<dyn DeliveryClient>> {
        self.client.take()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.client.is_some()
    }

    /// Start a new source: fresh controller at the lowest level, automatic mode.
    pub fn load_levels(&mut self, levels: Vec<QualityLevel>, now: Instant) {
        debug!(levels = levels.len(), "quality levels loaded");
        self.abr = Some(Bba2Controller::new_at(self.options.clone(), levels, now));
        self.manual.select(AbrMode::Auto);
    }

    #[must_use]
    pub fn levels(&self) -> &[QualityLevel] {
        match &self.abr {
            Some(abr) => abr.levels(),
            None => &[],
        }
    }

    #[must_use]
    pub fn mode(&self) -> AbrMode {
        self.manual.mode()
    }

    #[must_use]
    pub fn is_auto_mode(&self) -> bool {
        self.manual.is_auto()
    }

    #[must_use]
    pub fn stall_count(&self) -> u32 {
        self.manual.stall_count()
    }

    /// Level currently requested from the client.
    #[must_use]
    pub fn current_level(&self) -> usize {
        self.abr.as_ref().map_or(0, Bba2Controller::current_level)
    }

    /// Pin a level or release the pin.
    ///
    /// Returns `false` when absorbed because no client is attached. Pinned
    /// levels are clamped to the available range.
    pub fn select_quality(&mut self, mode: AbrMode, now: Instant) -> bool {
        let Some(client) = &self.client else {
            debug!(?mode, "quality selection ignored: no delivery client");
            return false;
        };

        match mode {
            AbrMode::Auto => {
                self.manual.select(AbrMode::Auto);
                client.set_current_level(LevelSelection::Auto);
            }
            AbrMode::Manual(level) => {
                let level = self
                    .abr
                    .as_ref()
                    .map_or(level, |abr| level.min(abr.max_level()));
                self.manual.select(AbrMode::Manual(level));
                if let Some(abr) = &mut self.abr {
                    abr.set_current_level(level, now);
                }
                client.set_current_level(LevelSelection::Fixed(level));
            }
        }
        true
    }

    /// Feed a delivery error. Only stalls count toward the manual revert.
    pub fn on_error(&mut self, record: &ErrorRecord) -> StallVerdict {
        let Some(client) = &self.client else {
            return StallVerdict::Ignored;
        };
        if !record.is_stall() {
            return StallVerdict::Ignored;
        }

        let verdict = self.manual.on_stall();
        if verdict == StallVerdict::Reverted {
            info!(level = self.current_level(), "pinned quality released after stalls");
            client.set_current_level(LevelSelection::Auto);
        }
        verdict
    }

    /// Run one BBA-2 step against the client's buffer reading.
    ///
    /// `None` while pinned, before levels are loaded, or with no client.
    pub fn tick(&mut self, now: Instant) -> Option<AbrDecision> {
        if !self.manual.is_auto() {
            return None;
        }
        let client = self.client.as_ref()?;
        let abr = self.abr.as_mut()?;

        let decision = abr.update(client.buffer_length(), client.is_seeking(), now);
        if decision.changed {
            client.set_current_level(LevelSelection::Fixed(decision.target_level));
        }
        Some(decision)
    }
}
