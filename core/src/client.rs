//! Stateless request builder for the node API.
//!
//! # Design
//! `DkgClient` holds only the connection target and timeout and carries no
//! mutable state between calls. Every endpoint has a `build_*` method that
//! validates its input and produces an `HttpRequest`; the response side is
//! handled by [`crate::pipeline::parse`]. Nothing here touches the network, so
//! any host that can execute an `HttpRequest` can drive the API.

use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::DkgError;
use crate::http::{media_type, HttpMethod, HttpRequest, CONTENT_TYPE, DEFAULT_TIMEOUT};
use crate::multipart::{FileData, MultipartBody};
use crate::options::{
    AssertionSearchOptions, EntitySearchOptions, NQuad, PublishOperation, PublishOptions, SparqlQueryType,
};
use crate::uri::ConnectionTarget;

const INFO: &str = "info";
const RESULT: &str = "result";
const RESOLVE: &str = "resolve";
const ENTITIES_SEARCH: &str = "entities:search";
const ASSERTIONS_SEARCH: &str = "assertions:search";
const QUERY: &str = "query";
const PROOFS: &str = "proofs:get";

/// Builds one `HttpRequest` per node API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkgClient {
    target: ConnectionTarget,
    timeout: Duration,
}

impl Default for DkgClient {
    fn default() -> Self {
        Self::new(ConnectionTarget::default())
    }
}

impl DkgClient {
    pub fn new(target: ConnectionTarget) -> Self {
        Self {
            target,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            target: config.target.clone(),
            timeout: config.timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // -----------------------------------------------------------------------
    // Generic builders
    // -----------------------------------------------------------------------

    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<String, DkgError> {
        self.target.url(segments, query)
    }

    pub fn get(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
            timeout: self.timeout,
        }
    }

    /// POST with a JSON body.
    pub fn post_json(&self, url: String, body: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![(CONTENT_TYPE.to_string(), media_type::APPLICATION_JSON.to_string())],
            body: Some(body.into_bytes()),
            timeout: self.timeout,
        }
    }

    /// POST with a `multipart/form-data` body. Fails when `body` has no parts.
    pub fn post_multipart(&self, url: String, body: &MultipartBody) -> Result<HttpRequest, DkgError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![(CONTENT_TYPE.to_string(), body.content_type())],
            body: Some(body.encode()?),
            timeout: self.timeout,
        })
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    pub fn build_info(&self) -> Result<HttpRequest, DkgError> {
        Ok(self.get(self.url(&[INFO], &[])?))
    }

    /// Multipart upload of an assertion file to `/publish`, `/provision` or
    /// `/update`.
    pub fn build_publish(
        &self,
        operation: PublishOperation,
        file_name: &str,
        data: &[u8],
        options: &PublishOptions,
    ) -> Result<HttpRequest, DkgError> {
        validate_publish(file_name, data)?;

        let mut body = MultipartBody::new().file(
            "file",
            file_name,
            FileData::new(media_type::APPLICATION_JSON_LD, data),
        );
        for (name, value) in options.form_parts() {
            body = body.text(name, value);
        }

        let url = self.url(&[operation.path()], &[])?;
        self.post_multipart(url, &body)
    }

    pub fn build_publish_result(&self, operation: PublishOperation, handler_id: &str) -> Result<HttpRequest, DkgError> {
        self.result_request(operation.path(), handler_id)
    }

    /// `GET /resolve?ids=a&ids=b`.
    pub fn build_resolve(&self, ids: &[String]) -> Result<HttpRequest, DkgError> {
        let query = repeated("ids", ids);
        Ok(self.get(self.url(&[RESOLVE], &query)?))
    }

    pub fn build_resolve_result(&self, handler_id: &str) -> Result<HttpRequest, DkgError> {
        self.result_request(RESOLVE, handler_id)
    }

    pub fn build_entities_search(&self, options: &EntitySearchOptions) -> Result<HttpRequest, DkgError> {
        if !options.has_search_term() {
            return Err(DkgError::Validation(
                "entity search options 'query' or 'ids' are required".to_string(),
            ));
        }
        Ok(self.get(self.url(&[ENTITIES_SEARCH], &options.query_params())?))
    }

    pub fn build_entities_search_result(&self, handler_id: &str) -> Result<HttpRequest, DkgError> {
        self.result_request(ENTITIES_SEARCH, handler_id)
    }

    pub fn build_assertions_search(&self, options: &AssertionSearchOptions) -> Result<HttpRequest, DkgError> {
        if !options.has_search_term() {
            return Err(DkgError::Validation(
                "assertion search option 'query' is required".to_string(),
            ));
        }
        Ok(self.get(self.url(&[ASSERTIONS_SEARCH], &options.query_params())?))
    }

    pub fn build_assertions_search_result(&self, handler_id: &str) -> Result<HttpRequest, DkgError> {
        self.result_request(ASSERTIONS_SEARCH, handler_id)
    }

    /// `POST /query?type=<type>` with `{"query": sparql}`.
    pub fn build_query(&self, query_type: SparqlQueryType, sparql: &str) -> Result<HttpRequest, DkgError> {
        let url = self.url(&[QUERY], &[("type", query_type.as_str().to_string())])?;
        let body = serde_json::json!({ "query": sparql }).to_string();
        Ok(self.post_json(url, body))
    }

    pub fn build_query_result(&self, handler_id: &str) -> Result<HttpRequest, DkgError> {
        self.result_request(QUERY, handler_id)
    }

    /// `POST /proofs:get?assertions=a&assertions=b` with `{"nquads": [...]}`.
    pub fn build_proofs(&self, nquads: &[NQuad], assertion_ids: &[String]) -> Result<HttpRequest, DkgError> {
        let url = self.url(&[PROOFS], &repeated("assertions", assertion_ids))?;
        let nquads = serde_json::to_value(nquads)
            .map_err(|e| DkgError::Validation(format!("unable to serialize n-quads: {e}")))?;
        let body = serde_json::json!({ "nquads": nquads }).to_string();
        Ok(self.post_json(url, body))
    }

    pub fn build_proofs_result(&self, handler_id: &str) -> Result<HttpRequest, DkgError> {
        self.result_request(PROOFS, handler_id)
    }

    fn result_request(&self, operation: &str, handler_id: &str) -> Result<HttpRequest, DkgError> {
        Ok(self.get(self.url(&[operation, RESULT, handler_id], &[])?))
    }
}

/// Checks applied to publish input before a request is built: the file must
/// have a `.json` extension and contain valid JSON.
pub fn validate_publish(file_name: &str, data: &[u8]) -> Result<(), DkgError> {
    let base_name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let extension = base_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    if extension != "json" {
        return Err(DkgError::Validation(format!(
            "File extension not supported: {extension}"
        )));
    }
    if serde_json::from_slice::<serde_json::Value>(data).is_err() {
        return Err(DkgError::Validation("Publish data is not valid JSON".to_string()));
    }
    Ok(())
}

fn repeated(key: &'static str, values: &[String]) -> Vec<(&'static str, String)> {
    values.iter().map(|value| (key, value.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Visibility;

    const ASSERTION: &[u8] = br#"{"@context":"https://schema.org","@id":"urn:test","name":"test"}"#;

    fn client() -> DkgClient {
        DkgClient::new(ConnectionTarget::http("localhost", 8900))
    }

    fn body_text(req: &HttpRequest) -> String {
        String::from_utf8(req.body.clone().unwrap()).unwrap()
    }

    #[test]
    fn build_info_produces_correct_request() {
        let req = client().build_info().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8900/info");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
        assert_eq!(req.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn build_publish_produces_multipart_request() {
        let options = PublishOptions::new(vec!["test_asset".into()], vec!["test_keyword".into()]);
        let req = client()
            .build_publish(PublishOperation::Publish, "assertion-example.json", ASSERTION, &options)
            .unwrap();

        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8900/publish");
        let content_type = req.header("Content-Type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let boundary = content_type.trim_start_matches("multipart/form-data; boundary=");

        let body = body_text(&req);
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.contains(
            "Content-Disposition: form-data; name=file; filename=assertion-example.json\r\n\
             Content-Type: application/ld+json; charset=utf-8\r\n\r\n"
        ));
        assert!(body.contains("Content-Disposition: form-data; name=assets\r\n\r\n[\"test_asset\"]\r\n"));
        assert!(body.contains("Content-Disposition: form-data; name=keywords\r\n\r\n[\"test_keyword\"]\r\n"));
        assert!(body.contains("Content-Disposition: form-data; name=visibility\r\n\r\npublic\r\n"));
        assert!(!body.contains("name=ual"));
        assert!(body.ends_with(&format!("--{boundary}--")));
    }

    #[test]
    fn build_publish_without_keywords_omits_part() {
        let options = PublishOptions::new(vec!["test_asset".into()], vec![]);
        let req = client()
            .build_publish(PublishOperation::Publish, "a.json", ASSERTION, &options)
            .unwrap();
        assert!(!body_text(&req).contains("name=keywords"));
    }

    #[test]
    fn build_provision_and_update_use_their_paths() {
        let options = PublishOptions {
            visibility: Visibility::Private,
            ual: Some("did:dkg:otp/0x1/1".into()),
            ..PublishOptions::default()
        };
        let req = client()
            .build_publish(PublishOperation::Provision, "a.json", ASSERTION, &options)
            .unwrap();
        assert_eq!(req.url, "http://localhost:8900/provision");
        assert!(body_text(&req).contains("name=ual\r\n\r\ndid:dkg:otp/0x1/1\r\n"));

        let req = client()
            .build_publish(PublishOperation::Update, "a.json", ASSERTION, &options)
            .unwrap();
        assert_eq!(req.url, "http://localhost:8900/update");
        assert!(body_text(&req).contains("name=visibility\r\n\r\nprivate\r\n"));
    }

    #[test]
    fn build_publish_rejects_wrong_extension() {
        let err = client()
            .build_publish(PublishOperation::Publish, "assertion.xml", ASSERTION, &PublishOptions::default())
            .unwrap_err();
        assert_eq!(err, DkgError::Validation("File extension not supported: xml".to_string()));
    }

    #[test]
    fn extension_is_text_after_last_dot_of_base_name() {
        assert!(validate_publish(".json", ASSERTION).is_ok());
        assert!(validate_publish("dir/car.v2.json", ASSERTION).is_ok());
        assert_eq!(
            validate_publish("assertion", ASSERTION).unwrap_err(),
            DkgError::Validation("File extension not supported: ".to_string())
        );
        assert_eq!(
            validate_publish("dir.json/assertion", ASSERTION).unwrap_err(),
            DkgError::Validation("File extension not supported: ".to_string())
        );
    }

    #[test]
    fn build_publish_rejects_invalid_json() {
        let err = client()
            .build_publish(PublishOperation::Publish, "a.json", b"{nope", &PublishOptions::default())
            .unwrap_err();
        assert_eq!(err, DkgError::Validation("Publish data is not valid JSON".to_string()));
    }

    #[test]
    fn build_result_requests() {
        let c = client();
        let id = "ffd8a00e-bf22-4432-8d88-804f4f9baa27";
        let cases = [
            (c.build_publish_result(PublishOperation::Publish, id), "publish/result"),
            (c.build_publish_result(PublishOperation::Update, id), "update/result"),
            (c.build_resolve_result(id), "resolve/result"),
            (c.build_entities_search_result(id), "entities:search/result"),
            (c.build_assertions_search_result(id), "assertions:search/result"),
            (c.build_query_result(id), "query/result"),
            (c.build_proofs_result(id), "proofs:get/result"),
        ];
        for (req, path) in cases {
            let req = req.unwrap();
            assert_eq!(req.method, HttpMethod::Get);
            assert_eq!(req.url, format!("http://localhost:8900/{path}/{id}"));
        }
    }

    #[test]
    fn build_resolve_repeats_ids() {
        let req = client().build_resolve(&["abc123".into()]).unwrap();
        assert_eq!(req.url, "http://localhost:8900/resolve?ids=abc123");

        let req = client().build_resolve(&["abc123".into(), "def456".into()]).unwrap();
        assert_eq!(req.url, "http://localhost:8900/resolve?ids=abc123&ids=def456");
    }

    #[test]
    fn build_entities_search_requires_term() {
        let err = client().build_entities_search(&EntitySearchOptions::default()).unwrap_err();
        assert!(err.is_validation());

        let options = EntitySearchOptions {
            ids: Some("id1".into()),
            limit: Some(3),
            ..EntitySearchOptions::default()
        };
        let req = client().build_entities_search(&options).unwrap();
        assert_eq!(req.url, "http://localhost:8900/entities:search?ids=id1&limit=3");
    }

    #[test]
    fn build_assertions_search_requires_query() {
        let err = client()
            .build_assertions_search(&AssertionSearchOptions::default())
            .unwrap_err();
        assert!(err.is_validation());

        let req = client()
            .build_assertions_search(&AssertionSearchOptions::query("car"))
            .unwrap();
        assert_eq!(req.url, "http://localhost:8900/assertions:search?query=car");
    }

    #[test]
    fn build_query_wraps_sparql_in_json() {
        let sparql = "CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p \"x\" }";
        let req = client().build_query(SparqlQueryType::Construct, sparql).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8900/query?type=construct");
        assert_eq!(req.header("content-type"), Some("application/json; charset=utf-8"));
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "query": sparql }));
    }

    #[test]
    fn build_proofs_sends_nquad_lines() {
        let nquads = vec![NQuad::new("<urn:s>", "<http://schema.org/name>", "\"n\"")];
        let req = client()
            .build_proofs(&nquads, &["a1".into(), "a2".into()])
            .unwrap();
        assert_eq!(req.url, "http://localhost:8900/proofs:get?assertions=a1&assertions=a2");
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "nquads": ["<urn:s> <http://schema.org/name> \"n\" ."] })
        );
    }

    #[test]
    fn same_input_gives_same_request() {
        let ids = vec!["abc".to_string(), "d e".to_string()];
        let a = client().build_resolve(&ids).unwrap();
        let b = client().build_resolve(&ids).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn configured_timeout_is_applied() {
        let c = client().with_timeout(Duration::from_millis(250));
        assert_eq!(c.build_info().unwrap().timeout, Duration::from_millis(250));
        assert_eq!(
            c.build_query(SparqlQueryType::Construct, "q").unwrap().timeout,
            Duration::from_millis(250)
        );
    }
}
