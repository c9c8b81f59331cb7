use agelens::app::generator::DOWNLOAD_NAME;
use agelens::app::{AppContext, Generator};
use agelens::config::settings::load_default_settings;
use agelens::entities::AgingStyle;
use agelens::errors::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: agelens <input-image> [rustico|natural|elegante] [output.png]";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings and build the context
    let settings = load_default_settings()
        .inspect_err(|e| error!("Critical error loading settings: {}", e))?;
    let context = AppContext::from_env(settings)?;
    info!("Running in {:?} mode", context.mode());

    // 4. Parse arguments
    let mut args = env::args().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        error!("{}", USAGE);
        return Err(Error::Validation {
            message: USAGE.to_string(),
        });
    };
    let style = args
        .next()
        .map(|arg| arg.parse::<AgingStyle>())
        .transpose()?
        .unwrap_or_default();
    let output = args.next().map_or_else(|| PathBuf::from(DOWNLOAD_NAME), PathBuf::from);

    // 5. Run the generator
    let mut generator = Generator::new(context);
    generator.load_file(&input).await?;
    generator.select_style(style);
    generator
        .process()
        .await
        .inspect_err(|e| error!("{}", e.user_message()))?;

    let image = generator.download()?;
    tokio::fs::write(&output, &image.bytes).await?;
    info!(
        "Wrote {} ({} bytes, style {})",
        output.display(),
        image.len(),
        style.label()
    );
    Ok(())
}
