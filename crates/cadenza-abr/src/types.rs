use std::time::Duration;

/// ABR mode selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AbrMode {
    /// Buffer-driven selection (BBA-2).
    #[default]
    Auto,
    /// Quality pinned by the viewer.
    /// Always use the specified level index.
    Manual(usize),
}

impl AbrMode {
    #[must_use]
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    #[must_use]
    pub fn pinned_level(&self) -> Option<usize> {
        match self {
            Self::Auto => None,
            Self::Manual(level) => Some(*level),
        }
    }
}

/// Encoded quality descriptor parsed from the manifest.
///
/// Levels are indexed from 0 in ascending bitrate order and never change
/// for the lifetime of a media source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualityLevel {
    pub index: usize,
    /// Bits per second.
    pub bitrate_bps: u64,
    pub width: u32,
    pub height: u32,
    pub name: Option<String>,
}

impl QualityLevel {
    #[must_use]
    pub fn new(index: usize, bitrate_bps: u64, width: u32, height: u32) -> Self {
        Self {
            index,
            bitrate_bps,
            width,
            height,
            name: None,
        }
    }

    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Menu label: the manifest name when present, otherwise `"{height}p"`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{}p", self.height),
        }
    }
}

/// Buffer-occupancy bracket driving the quality policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Zone {
    Emergency,
    Startup,
    Ramp,
    Steady,
    Full,
}

/// BBA-2 thresholds.
///
/// The four boundaries split the buffer axis into five zones:
/// `[0, emergency) [emergency, startup) [startup, ramp) [ramp, steady] (steady, ∞)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Bba2Options {
    /// Buffer length (seconds) below which the EMERGENCY zone applies.
    pub emergency_below_secs: f64,
    /// Upper bound of the STARTUP zone.
    pub startup_below_secs: f64,
    /// Upper bound of the RAMP zone; STEADY math is anchored here.
    pub ramp_below_secs: f64,
    /// Upper bound of the STEADY zone; anything above is FULL.
    pub steady_below_secs: f64,
    /// Buffer length that maps to the highest level inside STEADY.
    pub target_buffer_secs: f64,
    /// Minimum time at a level before an upgrade is allowed.
    pub min_dwell: Duration,
}

impl Default for Bba2Options {
    fn default() -> Self {
        Self {
            emergency_below_secs: 5.0,
            startup_below_secs: 10.0,
            ramp_below_secs: 20.0,
            steady_below_secs: 30.0,
            target_buffer_secs: 30.0,
            min_dwell: Duration::from_secs(10),
        }
    }
}

impl Bba2Options {
    #[must_use]
    pub fn with_boundaries(mut self, emergency: f64, startup: f64, ramp: f64, steady: f64) -> Self {
        self.emergency_below_secs = emergency;
        self.startup_below_secs = startup;
        self.ramp_below_secs = ramp;
        self.steady_below_secs = steady;
        self
    }

    #[must_use]
    pub fn with_target_buffer_secs(mut self, secs: f64) -> Self {
        self.target_buffer_secs = secs;
        self
    }

    #[must_use]
    pub fn with_min_dwell(mut self, dwell: Duration) -> Self {
        self.min_dwell = dwell;
        self
    }

    /// Map a buffer length onto its zone.
    #[must_use]
    pub fn classify(&self, buffer_secs: f64) -> Zone {
        if buffer_secs < self.emergency_below_secs {
            Zone::Emergency
        } else if buffer_secs < self.startup_below_secs {
            Zone::Startup
        } else if buffer_secs < self.ramp_below_secs {
            Zone::Ramp
        } else if buffer_secs <= self.steady_below_secs {
            Zone::Steady
        } else {
            Zone::Full
        }
    }

    /// Whether boundaries increase monotonically and the target buffer sits
    /// at or above the ramp boundary.
    ///
    /// Invalid options are still usable: STEADY simply stops moving.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.emergency_below_secs < self.startup_below_secs
            && self.startup_below_secs < self.ramp_below_secs
            && self.ramp_below_secs < self.steady_below_secs
            && self.target_buffer_secs >= self.ramp_below_secs
    }
}
