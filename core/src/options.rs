//! Request option structs.
//!
//! Each struct projects only its non-empty fields into form parts or query
//! parameters; absent and blank values are omitted from the wire entirely.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::DkgError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// Which publish-family endpoint to call. All three take the same form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOperation {
    Publish,
    Provision,
    Update,
}

impl PublishOperation {
    pub fn path(&self) -> &'static str {
        match self {
            PublishOperation::Publish => "publish",
            PublishOperation::Provision => "provision",
            PublishOperation::Update => "update",
        }
    }
}

/// Form fields sent alongside the assertion file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    pub assets: Vec<String>,
    pub keywords: Vec<String>,
    pub visibility: Visibility,
    pub ual: Option<String>,
}

impl PublishOptions {
    pub fn new(assets: Vec<String>, keywords: Vec<String>) -> Self {
        Self {
            assets,
            keywords,
            ..Self::default()
        }
    }

    /// `(name, value)` pairs for the non-file form parts, in wire order.
    /// List fields are sent as JSON arrays.
    pub fn form_parts(&self) -> Vec<(&'static str, String)> {
        let mut parts = Vec::new();
        if !self.assets.is_empty() {
            parts.push(("assets", json_array(&self.assets)));
        }
        if !self.keywords.is_empty() {
            parts.push(("keywords", json_array(&self.keywords)));
        }
        parts.push(("visibility", self.visibility.as_str().to_string()));
        if let Some(ual) = non_blank(&self.ual) {
            parts.push(("ual", ual.to_string()));
        }
        parts
    }
}

/// Query parameters for `GET /entities:search`. Either `query` or `ids`
/// must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySearchOptions {
    pub query: Option<String>,
    pub ids: Option<String>,
    pub issuers: Option<String>,
    pub types: Option<String>,
    pub prefix: Option<bool>,
    pub framing_criteria: Option<String>,
    pub limit: Option<u32>,
    pub load: Option<bool>,
}

impl EntitySearchOptions {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn has_search_term(&self) -> bool {
        non_blank(&self.query).is_some() || non_blank(&self.ids).is_some()
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_text(&mut params, "query", &self.query);
        push_text(&mut params, "ids", &self.ids);
        push_text(&mut params, "issuers", &self.issuers);
        push_text(&mut params, "types", &self.types);
        push_display(&mut params, "prefix", &self.prefix);
        push_text(&mut params, "framingCriteria", &self.framing_criteria);
        push_display(&mut params, "limit", &self.limit);
        push_display(&mut params, "load", &self.load);
        params
    }
}

/// Query parameters for `GET /assertions:search`. `query` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssertionSearchOptions {
    pub query: Option<String>,
    pub load: Option<bool>,
}

impl AssertionSearchOptions {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            load: None,
        }
    }

    pub fn has_search_term(&self) -> bool {
        non_blank(&self.query).is_some()
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_text(&mut params, "query", &self.query);
        push_display(&mut params, "load", &self.load);
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SparqlQueryType {
    #[default]
    Construct,
}

impl SparqlQueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SparqlQueryType::Construct => "construct",
        }
    }
}

/// An RDF statement, serialized as its N-Quads line (`s p o [g] .`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NQuad {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub graph: Option<String>,
}

impl NQuad {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: None,
        }
    }

    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }
}

impl fmt::Display for NQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(graph) = non_blank(&self.graph) {
            write!(f, " {graph}")?;
        }
        write!(f, " .")
    }
}

/// Parses one N-Quads line. Subject and predicate are the first two terms;
/// everything up to the closing ` .` is kept as the object, graph included.
impl FromStr for NQuad {
    type Err = DkgError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = || DkgError::Validation(format!("not an N-Quad: {line}"));
        let body = line.trim().strip_suffix('.').ok_or_else(invalid)?.trim_end();
        let (subject, rest) = body.split_once(char::is_whitespace).ok_or_else(invalid)?;
        let (predicate, object) = rest.trim_start().split_once(char::is_whitespace).ok_or_else(invalid)?;
        let object = object.trim();
        if object.is_empty() {
            return Err(invalid());
        }
        Ok(NQuad::new(subject, predicate, object))
    }
}

impl Serialize for NQuad {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn push_text(params: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(value) = non_blank(value) {
        params.push((key, value.to_string()));
    }
}

fn push_display<T: ToString>(params: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<T>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

fn json_array(values: &[String]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_options_include_only_set_fields() {
        let options = PublishOptions::new(vec!["test_asset".into()], vec![]);
        assert_eq!(
            options.form_parts(),
            vec![
                ("assets", r#"["test_asset"]"#.to_string()),
                ("visibility", "public".to_string()),
            ]
        );
    }

    #[test]
    fn publish_options_full() {
        let options = PublishOptions {
            assets: vec!["a".into()],
            keywords: vec!["k1".into(), "k2".into()],
            visibility: Visibility::Private,
            ual: Some("dkg://ual".into()),
        };
        assert_eq!(
            options.form_parts(),
            vec![
                ("assets", r#"["a"]"#.to_string()),
                ("keywords", r#"["k1","k2"]"#.to_string()),
                ("visibility", "private".to_string()),
                ("ual", "dkg://ual".to_string()),
            ]
        );
    }

    #[test]
    fn blank_ual_is_omitted() {
        let options = PublishOptions {
            ual: Some("   ".into()),
            ..PublishOptions::default()
        };
        assert!(options.form_parts().iter().all(|(name, _)| *name != "ual"));
    }

    #[test]
    fn entity_search_params_in_fixed_order() {
        let options = EntitySearchOptions {
            query: Some("car".into()),
            ids: Some("".into()),
            types: Some("Product".into()),
            prefix: Some(true),
            framing_criteria: Some("{}".into()),
            limit: Some(20),
            load: Some(false),
            ..EntitySearchOptions::default()
        };
        assert_eq!(
            options.query_params(),
            vec![
                ("query", "car".to_string()),
                ("types", "Product".to_string()),
                ("prefix", "true".to_string()),
                ("framingCriteria", "{}".to_string()),
                ("limit", "20".to_string()),
                ("load", "false".to_string()),
            ]
        );
    }

    #[test]
    fn entity_search_term_required() {
        assert!(!EntitySearchOptions::default().has_search_term());
        assert!(EntitySearchOptions { ids: Some("id".into()), ..Default::default() }.has_search_term());
        assert!(!AssertionSearchOptions { query: Some(" ".into()), load: Some(true) }.has_search_term());
    }

    #[test]
    fn nquad_renders_with_and_without_graph() {
        let quad = NQuad::new("<s>", "<p>", "\"o\"");
        assert_eq!(quad.to_string(), "<s> <p> \"o\" .");
        assert_eq!(quad.with_graph("<g>").to_string(), "<s> <p> \"o\" <g> .");
    }

    #[test]
    fn nquad_parses_its_own_rendering() {
        let quad: NQuad = "<urn:s> <urn:p> \"two words\" <urn:g> .".parse().unwrap();
        assert_eq!(quad.subject, "<urn:s>");
        assert_eq!(quad.predicate, "<urn:p>");
        assert_eq!(quad.to_string(), "<urn:s> <urn:p> \"two words\" <urn:g> .");

        assert!("<s> <p> <o>".parse::<NQuad>().unwrap_err().is_validation());
        assert!("<s> <p> .".parse::<NQuad>().is_err());
    }

    #[test]
    fn nquad_serializes_as_string() {
        let json = serde_json::to_string(&vec![NQuad::new("<s>", "<p>", "<o>")]).unwrap();
        assert_eq!(json, r#"["<s> <p> <o> ."]"#);
    }
}
