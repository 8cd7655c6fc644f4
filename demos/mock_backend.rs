//! Toy backend for trying the balancer by hand.
//!
//! ```text
//! cargo run --example mock_backend -- --port 9001
//! cargo run --example mock_backend -- --port 9002
//! ```
//!
//! Serves `/books` (the default health check path) and echoes its own port
//! on `/` so round-robin rotation is visible from curl.

use axum::{extract::State, routing::get, Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use std::net::SocketAddr;

#[derive(Parser)]
struct Args {
    #[arg(short, long, default_value_t = 9001)]
    port: u16,
}

async fn books(State(port): State<u16>) -> Json<Value> {
    Json(json!([
        { "id": 1, "title": "The Rust Programming Language", "served_by": port },
        { "id": 2, "title": "Programming Rust", "served_by": port },
    ]))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let app = Router::new()
        .route("/", get(|State(port): State<u16>| async move { format!("hello from backend :{}", port) }))
        .route("/books", get(books))
        .with_state(args.port);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("Mock backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
