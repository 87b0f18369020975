//! Drive a playback engine against an in-memory delivery client and a
//! local stub of the session service.
//!
//! ```
//! RUST_LOG=debug cargo run -p cadenza --example simulated_playback
//! ```

use std::{error::Error, sync::Arc, time::Duration};

use cadenza::{play::mock::FakeDeliveryClient, prelude::*};
use cadenza_test_utils::{SessionService, TestHttpServer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Buffer readings (seconds) reported on successive polls.
const BUFFER_TRACE: &[f64] = &[
    1.0, 3.5, 6.0, 8.0, 12.0, 15.0, 18.0, 22.0, 25.0, 27.0, 31.0, 34.0, 12.0, 4.0, 9.0,
];

fn ladder() -> Vec<QualityLevel> {
    vec![
        QualityLevel::new(0, 400_000, 640, 360),
        QualityLevel::new(1, 1_200_000, 1280, 720),
        QualityLevel::new(2, 3_000_000, 1920, 1080).with_name("Full HD"),
        QualityLevel::new(3, 6_000_000, 3840, 2160).with_name("4K"),
    ]
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let engine = PlaybackEngine::new(
        PlayerConfig::default().with_abr(Bba2Options::default().with_min_dwell(Duration::ZERO)),
    );
    let mut events = engine.subscribe();

    // Admission first: nothing is played without a session.
    let service = SessionService::granting("demo-session", "demo-token", "2030-01-01T00:00:00Z");
    let server = TestHttpServer::new(service.router()).await;
    let options = SessionOptions::new(
        server.url("admission"),
        server.url("sessions"),
        "https://media.example/vod".parse()?,
    )
    .with_auth_token("demo");
    let net: Arc<dyn Net> = Arc::new(HttpClient::new(NetOptions::default())?);
    let sessions = engine.session_manager(net, options);

    let request = AdmissionRequest {
        user_id: "viewer-1".into(),
        media_id: "big-buck-bunny".into(),
        device_id: "laptop".into(),
        ..AdmissionRequest::default()
    };
    let session = sessions.start_session(&request).await?;
    info!(url = %session.playback_url, "playback admitted");

    let client = Arc::new(FakeDeliveryClient::new().with_switch_events());
    engine.attach_client(client.clone());
    client.emit(ManifestParsed {
        levels: ladder(),
        audio_tracks: Vec::new(),
    });

    for (poll, &buffer) in BUFFER_TRACE.iter().enumerate() {
        client.set_buffer_length(buffer);
        client.set_seeking(poll == 12);
        if let Some(decision) = engine.tick() {
            info!(
                poll,
                buffer,
                level = decision.target_level,
                reason = ?decision.reason,
                "abr decision"
            );
        }
    }

    // Pin 4K, then let the network stall it back to auto.
    engine.select_quality(AbrMode::Manual(3));
    for _ in 0..3 {
        client.emit(ErrorRecord::stall());
    }

    sessions.end_session().await;

    while let Ok(event) = events.try_recv() {
        match event {
            PlayerEvent::QualityChanged { from, to, reason } => {
                let levels = engine.levels();
                let label = |i: usize| {
                    levels
                        .get(i)
                        .map(|l| format!("{} ({})", l.label(), format_bitrate(l.bitrate_bps)))
                        .unwrap_or_default()
                };
                info!(from = %label(from), to = %label(to), ?reason, "quality changed");
            }
            PlayerEvent::Error(error) => warn!(
                kind = %error.kind,
                details = %error.details,
                retry = engine.should_retry(&error),
                "{}",
                error.message
            ),
            other => info!(?other, "event"),
        }
    }

    let validity = session.remaining(session.started_at).as_secs_f64();
    info!(validity = %format_time(validity), "done");
    Ok(())
}
