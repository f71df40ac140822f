//! Test servers for the DKG client.
//!
//! - [`MockServer`] records every request and answers from a script.
//! - [`app`] is an in-memory simulated node serving the full node API.

pub mod node;
pub mod scripted;

pub use node::{NodeError, SimulatedNode, NODE_VERSION};
pub use scripted::{MockResponse, MockServer, RecordedRequest};

use axum::Router;
use tokio::net::TcpListener;

/// Router for a fresh simulated node with empty state.
pub fn app() -> Router {
    SimulatedNode::new().router()
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, SimulatedNode::new()).await
}

pub async fn serve(listener: TcpListener, node: SimulatedNode) -> Result<(), std::io::Error> {
    axum::serve(listener, node.router()).await
}
