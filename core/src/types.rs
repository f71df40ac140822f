//! Response DTOs for the node API.
//!
//! # Design
//! `status` (where present) is the only required field of a result; the node
//! omits most other fields while an operation is still pending, so they
//! default when absent. Handler ids, node info and the top-level result
//! envelopes reject fields they do not define. A body that lacks a required
//! field or carries an unexpected one is reported as `DkgError::ResponseBody`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token returned by every initiating call; pass it to the matching
/// `*_result` call to fetch the outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HandlerId {
    pub handler_id: String,
}

impl HandlerId {
    pub fn as_str(&self) -> &str {
        &self.handler_id
    }
}

/// `GET /info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NodeInfo {
    pub version: String,
    pub auto_update: bool,
    pub telemetry: bool,
}

/// Operation status reported by result endpoints.
pub mod status {
    pub const PENDING: &str = "PENDING";
    pub const COMPLETED: &str = "COMPLETED";
    pub const FAILED: &str = "FAILED";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub data_hash: Option<String>,
    pub issuer: Option<String>,
    #[serde(rename = "UALs")]
    pub uals: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub timestamp: Option<String>,
    pub visibility: Option<String>,
    pub latest_state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishResultData {
    pub id: Option<String>,
    pub root_hash: Option<String>,
    pub signature: Option<String>,
    pub metadata: Option<Metadata>,
    pub metadata_hash: Option<String>,
    pub blockchain: Option<Value>,
}

/// `GET /{publish,provision,update}/result/{handler_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PublishResult {
    pub status: String,
    #[serde(default)]
    pub data: Option<PublishResultData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveResultData {
    pub id: Option<String>,
    pub metadata: Option<Metadata>,
    pub blockchain: Option<Value>,
    pub assets: Vec<String>,
    pub keywords: Vec<String>,
    pub signature: Option<String>,
    pub root_hash: Option<String>,
    pub data: Value,
}

/// `GET /resolve/result/{handler_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResolveResult {
    pub status: String,
    #[serde(default)]
    pub data: Vec<ResolveResultData>,
}

/// `GET /query/result/{handler_id}`. `data` holds N-Quad lines for
/// construct queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QueryResult {
    pub status: String,
    #[serde(default)]
    pub data: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Proof {
    pub triple: Option<String>,
    pub triple_hash: Option<String>,
    pub proof: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProofsResultData {
    pub assertion_id: Option<String>,
    pub proofs: Vec<Proof>,
}

/// `GET /proofs:get/result/{handler_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProofsResult {
    pub status: String,
    #[serde(default)]
    pub data: Vec<ProofsResultData>,
}

/// Implemented by result types that carry an operation status.
pub trait OperationStatus {
    fn status(&self) -> &str;

    fn is_pending(&self) -> bool {
        self.status() == status::PENDING
    }
}

macro_rules! impl_operation_status {
    ($($ty:ty),*) => {
        $(impl OperationStatus for $ty {
            fn status(&self) -> &str {
                &self.status
            }
        })*
    };
}

impl_operation_status!(PublishResult, ResolveResult, QueryResult, ProofsResult);
