#![forbid(unsafe_code)]

//! Events flowing into and out of the playback core.
//!
//! Inbound: [`DeliveryEvent`]s reported by the segmented-media client and
//! fanned out through a [`ListenerRegistry`]. Outbound: any cloneable event
//! type published on an [`EventBus`].

mod bus;
mod delivery;
mod media;
mod registry;

pub use bus::EventBus;
pub use delivery::{DeliveryEvent, ErrorRecord, ManifestParsed, details, kinds};
pub use media::{AudioTrack, SubtitleFormat, SubtitleTrack};
pub use registry::{ListenerRegistry, Subscription};
