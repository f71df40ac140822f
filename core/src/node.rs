//! Async facade over the request builder, the pipeline and a transport.
//!
//! # Design
//! `DkgNode` pairs an immutable [`DkgClient`] with a shared [`Transport`]
//! behind an `Arc`; cloning a node is cheap and clones share the connection
//! pool. Every operation returns a boxed `'static` future, so results can be
//! awaited in place or handed to `tokio::spawn`.
//!
//! Operations that validate caller input return `Result<ResponseFuture<_>>`:
//! a validation failure is reported before any future exists and before the
//! transport is touched. URI, HTTP, transport and body errors arrive through
//! the future.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::client::DkgClient;
use crate::config::ClientConfig;
use crate::error::DkgError;
use crate::http::HttpRequest;
use crate::options::{
    AssertionSearchOptions, EntitySearchOptions, NQuad, PublishOperation, PublishOptions, SparqlQueryType,
};
use crate::pipeline::{dispatch, FromBody};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{HandlerId, NodeInfo, ProofsResult, PublishResult, QueryResult, ResolveResult};

/// Pending outcome of one node API call.
pub type ResponseFuture<T> = Pin<Box<dyn Future<Output = Result<T, DkgError>> + Send + 'static>>;

/// Client for one DKG node.
#[derive(Debug)]
pub struct DkgNode<T: Transport = ReqwestTransport> {
    client: DkgClient,
    transport: Arc<T>,
}

impl<T: Transport> Clone for DkgNode<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl DkgNode<ReqwestTransport> {
    /// Node backed by `reqwest`, with `config.timeout` used both as connect
    /// timeout and per-request timeout.
    pub fn connect(config: &ClientConfig) -> Result<Self, DkgError> {
        let transport = ReqwestTransport::with_connect_timeout(config.timeout)?;
        Ok(Self::with_transport(DkgClient::from_config(config), transport))
    }
}

impl<T: Transport + 'static> DkgNode<T> {
    pub fn with_transport(client: DkgClient, transport: T) -> Self {
        Self::with_shared_transport(client, Arc::new(transport))
    }

    pub fn with_shared_transport(client: DkgClient, transport: Arc<T>) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &DkgClient {
        &self.client
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Dispatch a built request and decode the body as `R`. A build error is
    /// delivered through the returned future.
    pub fn execute<R>(&self, request: Result<HttpRequest, DkgError>) -> ResponseFuture<R>
    where
        R: FromBody + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        Box::pin(async move {
            let body = dispatch(transport.as_ref(), request?).await?;
            R::from_body(body)
        })
    }

    /// Like [`execute`](Self::execute), but a validation error is returned
    /// immediately instead of through the future.
    fn execute_validated<R>(&self, request: Result<HttpRequest, DkgError>) -> Result<ResponseFuture<R>, DkgError>
    where
        R: FromBody + Send + 'static,
    {
        match request {
            Err(err @ DkgError::Validation(_)) => Err(err),
            request => Ok(self.execute(request)),
        }
    }

    pub fn info(&self) -> ResponseFuture<NodeInfo> {
        self.execute(self.client.build_info())
    }

    pub fn publish(
        &self,
        file_name: &str,
        data: &[u8],
        options: &PublishOptions,
    ) -> Result<ResponseFuture<HandlerId>, DkgError> {
        self.publish_with(PublishOperation::Publish, file_name, data, options)
    }

    pub fn provision(
        &self,
        file_name: &str,
        data: &[u8],
        options: &PublishOptions,
    ) -> Result<ResponseFuture<HandlerId>, DkgError> {
        self.publish_with(PublishOperation::Provision, file_name, data, options)
    }

    pub fn update(
        &self,
        file_name: &str,
        data: &[u8],
        options: &PublishOptions,
    ) -> Result<ResponseFuture<HandlerId>, DkgError> {
        self.publish_with(PublishOperation::Update, file_name, data, options)
    }

    pub fn publish_with(
        &self,
        operation: PublishOperation,
        file_name: &str,
        data: &[u8],
        options: &PublishOptions,
    ) -> Result<ResponseFuture<HandlerId>, DkgError> {
        self.execute_validated(self.client.build_publish(operation, file_name, data, options))
    }

    /// Read `path` and publish its contents under the file's own name.
    pub fn publish_file(
        &self,
        operation: PublishOperation,
        path: impl AsRef<Path>,
        options: &PublishOptions,
    ) -> Result<ResponseFuture<HandlerId>, DkgError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            DkgError::Validation(format!("Exception reading publish file: {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| DkgError::Validation(format!("Publish path has no file name: {}", path.display())))?;
        self.publish_with(operation, file_name, &data, options)
    }

    pub fn publish_result(&self, operation: PublishOperation, handler_id: &str) -> ResponseFuture<PublishResult> {
        self.execute(self.client.build_publish_result(operation, handler_id))
    }

    pub fn resolve(&self, ids: &[String]) -> ResponseFuture<HandlerId> {
        self.execute(self.client.build_resolve(ids))
    }

    pub fn resolve_result(&self, handler_id: &str) -> ResponseFuture<ResolveResult> {
        self.execute(self.client.build_resolve_result(handler_id))
    }

    pub fn entities_search(&self, options: &EntitySearchOptions) -> Result<ResponseFuture<HandlerId>, DkgError> {
        self.execute_validated(self.client.build_entities_search(options))
    }

    pub fn entities_search_result(&self, handler_id: &str) -> ResponseFuture<Value> {
        self.execute(self.client.build_entities_search_result(handler_id))
    }

    pub fn assertions_search(
        &self,
        options: &AssertionSearchOptions,
    ) -> Result<ResponseFuture<HandlerId>, DkgError> {
        self.execute_validated(self.client.build_assertions_search(options))
    }

    pub fn assertions_search_result(&self, handler_id: &str) -> ResponseFuture<Value> {
        self.execute(self.client.build_assertions_search_result(handler_id))
    }

    pub fn query(&self, query_type: SparqlQueryType, sparql: &str) -> ResponseFuture<HandlerId> {
        self.execute(self.client.build_query(query_type, sparql))
    }

    pub fn query_result(&self, handler_id: &str) -> ResponseFuture<QueryResult> {
        self.execute(self.client.build_query_result(handler_id))
    }

    pub fn proofs(&self, nquads: &[NQuad], assertion_ids: &[String]) -> Result<ResponseFuture<HandlerId>, DkgError> {
        self.execute_validated(self.client.build_proofs(nquads, assertion_ids))
    }

    pub fn proofs_result(&self, handler_id: &str) -> ResponseFuture<ProofsResult> {
        self.execute(self.client.build_proofs_result(handler_id))
    }
}
