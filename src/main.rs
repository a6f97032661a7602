use portfolio_contact::config::ServerConfig;
use portfolio_contact::error::Result;
use portfolio_contact::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // A missing .env is fine; real deployments set the environment directly.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let config = ServerConfig::from_env()?;

    eprintln!("📬 Portfolio contact v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/contact", config.port);
    eprintln!(
        "   Mode: {}",
        if config.environment.is_development() {
            "development"
        } else {
            "production"
        }
    );

    server::run(config).await?;
    Ok(())
}
