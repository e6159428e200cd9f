//! Greeting server: accepts WebSocket upgrades and welcomes each client.
//!
//! Run with: cargo run --example greet_server
//! Then connect with any WebSocket client on ws://127.0.0.1:8000/

use tokio::net::TcpListener;

use websock::{Config, WsServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let listener = TcpListener::bind("0.0.0.0:8000").await?;
    tracing::info!("listening on port 8000");

    let server = WsServer::new(Config::default());

    server
        .serve(listener, |mut conn, info| async move {
            tracing::info!(peer = %info.peer, path = %info.path, "greeting client");
            conn.send_text("Hello! Thanks for connecting!\n", Default::default(), 0)
                .await
                .ok();
        })
        .await?;

    Ok(())
}
