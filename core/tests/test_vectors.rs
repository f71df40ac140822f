//! Verify build and parse against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or errors. Comparing parsed JSON (not raw
//! strings) avoids false negatives from field-ordering differences.

use std::fmt::Debug;

use dkg_client::{
    pipeline, ConnectionTarget, DkgClient, DkgError, FromBody, HandlerId, HttpMethod, HttpRequest, HttpResponse,
    NodeInfo, ProofsResult, PublishOperation, PublishResult, QueryResult, ResolveResult, SparqlQueryType,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8900";

fn client() -> DkgClient {
    DkgClient::new(ConnectionTarget::http("localhost", 8900))
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    if let Some(headers) = expected.get("headers") {
        let expected_headers: Vec<(String, String)> = headers
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
    }

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

/// Parse the simulated response as `T` and compare with `expected_result`
/// or `expected_error`.
fn check_parse<T>(name: &str, case: &Value)
where
    T: FromBody + DeserializeOwned + PartialEq + Debug,
{
    let result = pipeline::parse::<T>(simulated(case));

    if let Some(expected_error) = case.get("expected_error") {
        let err = result.unwrap_err();
        match expected_error["kind"].as_str().unwrap() {
            "Http" => assert_eq!(
                err,
                DkgError::Http {
                    status: expected_error["status"].as_u64().unwrap() as u16,
                    body: expected_error["body"].as_str().unwrap().to_string(),
                },
                "{name}: http error"
            ),
            "ResponseBody" => assert!(matches!(err, DkgError::ResponseBody(_)), "{name}: expected ResponseBody, got {err:?}"),
            other => panic!("{name}: unknown expected_error: {other}"),
        }
    } else {
        let expected: T = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(result.unwrap(), expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Info
// ---------------------------------------------------------------------------

#[test]
fn info_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/info.json")) {
        let name = case["name"].as_str().unwrap();
        let req = c.build_info().unwrap();
        check_request(name, &req, &case["expected_request"]);
        check_parse::<NodeInfo>(name, &case);
    }
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/resolve.json")) {
        let name = case["name"].as_str().unwrap();
        let ids: Vec<String> = serde_json::from_value(case["input_ids"].clone()).unwrap();
        let req = c.build_resolve(&ids).unwrap();
        check_request(name, &req, &case["expected_request"]);
        check_parse::<HandlerId>(name, &case);
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[test]
fn query_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/query.json")) {
        let name = case["name"].as_str().unwrap();
        let sparql = case["input"]["sparql"].as_str().unwrap();
        let req = c.build_query(SparqlQueryType::Construct, sparql).unwrap();
        check_request(name, &req, &case["expected_request"]);
        check_parse::<HandlerId>(name, &case);
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[test]
fn result_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/results.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["handler_id"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();

        let req = match operation {
            "publish" => c.build_publish_result(PublishOperation::Publish, id),
            "resolve" => c.build_resolve_result(id),
            "query" => c.build_query_result(id),
            "proofs:get" => c.build_proofs_result(id),
            other => panic!("{name}: unknown operation: {other}"),
        }
        .unwrap();
        check_request(name, &req, &case["expected_request"]);

        match operation {
            "publish" => check_parse::<PublishResult>(name, &case),
            "resolve" => check_parse::<ResolveResult>(name, &case),
            "query" => check_parse::<QueryResult>(name, &case),
            _ => check_parse::<ProofsResult>(name, &case),
        }
    }
}
