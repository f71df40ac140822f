//! Async client for the HTTP API of a DKG knowledge-graph node.
//!
//! # Overview
//! Every node call is a two-step exchange: an operation request returns a
//! handler id, and a `/{operation}/result/{handler_id}` request returns the
//! outcome. This crate builds those requests, sends them and turns the
//! responses into typed results.
//!
//! # Design
//! - `DkgClient` is stateless and builds `HttpRequest` values without touching
//!   the network (host-does-IO pattern); `pipeline::parse` consumes an
//!   `HttpResponse`. Hosts with their own HTTP stack only need these two.
//! - `DkgNode` wires the builder to a [`Transport`] and exposes one async
//!   method per endpoint. The default transport is `reqwest`.
//! - Errors are one enum, [`DkgError`]. Input validation fails synchronously,
//!   before any request leaves the process.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod node;
pub mod options;
pub mod pipeline;
pub mod transport;
pub mod types;
pub mod uri;

pub use client::DkgClient;
pub use config::ClientConfig;
pub use error::DkgError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::{FileData, MultipartBody};
pub use node::{DkgNode, ResponseFuture};
pub use options::{
    AssertionSearchOptions, EntitySearchOptions, NQuad, PublishOperation, PublishOptions, SparqlQueryType, Visibility,
};
pub use pipeline::{parse, FromBody};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    HandlerId, Metadata, NodeInfo, OperationStatus, Proof, ProofsResult, ProofsResultData, PublishResult,
    PublishResultData, QueryResult, ResolveResult, ResolveResultData,
};
pub use uri::{ConnectionTarget, Scheme};
