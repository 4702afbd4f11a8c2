use httpwire::config::Config;
use httpwire::proxy::Upstream;
use httpwire::routes::DemoHandler;
use httpwire::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let upstream = Upstream::new(cfg.upstream_url()?)?;
    tracing::info!(upstream = %upstream.base(), "Relaying /httpbin/stream");

    let mut server =
        Server::serve(cfg.server.listen_addr.as_str(), DemoHandler::new(upstream)).await?;
    tracing::info!("Server started on {}", server.local_addr());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    server.close().await?;
    tracing::info!("Server gracefully stopped");

    Ok(())
}
