#![forbid(unsafe_code)]
#![allow(clippy::missing_panics_doc)]

//! Shared fixtures for cadenza integration tests.

pub mod http_server;
pub mod recording_net;
pub mod session_service;

pub use http_server::TestHttpServer;
pub use recording_net::{NetCall, NetMethod, RecordingNet};
pub use session_service::SessionService;
