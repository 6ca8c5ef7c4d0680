use std::process::ExitCode;
use std::sync::Arc;

use microcap_app::{
    AppConfig, AppError, CaptureOutcome, CaptureSession, SessionParts, app_version, config,
    init_tracing,
};
use microcap_core::SystemClock;
use microcap_mirror::{InMemoryMediaLibrary, Permission};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    info!(version = app_version(), "microcap starting");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "microcap stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let built = config.build_source()?;
    info!(
        source = %config.source_kind,
        data_dir = %config.documents_root.display(),
        "configuration loaded"
    );

    // Headless runs have no platform photo library.
    let session = CaptureSession::new(
        &config,
        SessionParts {
            source: built.source,
            library: Arc::new(InMemoryMediaLibrary::new(Permission::Denied)),
            clock: Arc::new(SystemClock),
        },
    );

    let report = session.startup().await;
    for capture in &report.captures {
        info!(
            capture_id = %capture.id,
            name = %capture.display_name(),
            in_gallery = capture.in_gallery(),
            "capture"
        );
    }

    let capture_once = std::env::var("MICROCAP_CAPTURE_ONCE")
        .map(|value| config::switch_enabled(&value))
        .unwrap_or(false);
    if !capture_once {
        return Ok(());
    }

    let live_view = session.enter_live_view();
    let liveness = session.probe_now().await;
    info!(live = liveness.live, "source probed");

    let outcome = session.capture().await;
    live_view.close().await;

    match outcome? {
        CaptureOutcome::Saved(capture) => {
            info!(capture_id = %capture.id, name = %capture.display_name(), "captured one frame");
        }
        CaptureOutcome::Dropped => info!("capture request dropped"),
    }
    Ok(())
}
