use anyhow::Result;
use bpq::cli::build_cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    bpq::cli::handlers::dispatch(&matches).await
}
