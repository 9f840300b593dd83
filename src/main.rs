use strideview::app::OverlayApp;
use strideview::config::Settings;
use strideview::error::AppError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let settings = Settings::load()?;
    info!("Starting StrideView");
    OverlayApp::start_gui(settings)
}
