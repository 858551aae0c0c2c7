use authgate::{config::Config, start_server};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // Start the server in a background task so we can listen for Ctrl-C in the main task
    let server_task = tokio::spawn(async move {
        if let Err(e) = start_server(config, shutdown_rx).await {
            eprintln!("server error: {}", e);
        }
    });

    // Wait for Ctrl-C
    tokio::signal::ctrl_c().await?;
    println!("shutdown requested, stopping server...");

    // Signal the server to stop; give a short grace period for cleanup
    let _ = shutdown_tx.send(());
    tokio::time::sleep(Duration::from_millis(200)).await;
    server_task.abort();

    println!("server stopped");
    Ok(())
}
