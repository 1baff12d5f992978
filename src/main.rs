use bloom::app::App;
use bloom::cli::Args;
use bloom::config::Config;
use bloom::logging::setup_logging;
use clap::Parser;
use figment::{Figment, providers::Env};
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config and setup logging before App::new() so startup logs are
    // never silently dropped.
    let config: Config = Figment::new()
        .merge(Env::raw())
        .extract()
        .expect("Failed to load config");
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting bloom"
    );

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = ?e, "Failed to initialize application");
            return ExitCode::FAILURE;
        }
    };

    app.run().await
}
