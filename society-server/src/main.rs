use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = society_server::build()?;

    let host = server
        .ax
        .app
        .get("http.host")
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = server
        .ax
        .app
        .get("http.port")
        .unwrap_or_else(|| "3036".to_string());

    let _scheduler = server.scheduler.spawn();
    server.ax.listen(format!("{host}:{port}")).await?;

    Ok(())
}
