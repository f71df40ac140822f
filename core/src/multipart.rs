//! `multipart/form-data` body encoder.
//!
//! Each part is written as
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name=<name>[; filename=<file>]\r\n
//! [Content-Type: <type>\r\n]
//! \r\n
//! <value or raw bytes>\r\n
//! ```
//!
//! followed by a closing `--<boundary>--` with no trailing CRLF. Names and
//! file names are written unquoted; the node accepts this form and tests
//! assert on it.

use uuid::Uuid;

use crate::error::DkgError;
use crate::http::media_type;

/// Raw content for a file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FileData {
    pub fn new(content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone)]
enum Part {
    Text {
        name: String,
        value: String,
        content_type: Option<String>,
    },
    File {
        name: String,
        file_name: String,
        file: FileData,
    },
}

/// Ordered collection of form parts plus the boundary that separates them.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    /// Empty body with a fresh random boundary.
    pub fn new() -> Self {
        Self::with_boundary(Uuid::new_v4().to_string())
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("{}; boundary={}", media_type::MULTIPART_FORM_DATA, self.boundary)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
            content_type: None,
        });
        self
    }

    pub fn typed_text(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
            content_type: Some(content_type.into()),
        });
        self
    }

    pub fn file(mut self, name: impl Into<String>, file_name: impl Into<String>, file: FileData) -> Self {
        self.parts.push(Part::File {
            name: name.into(),
            file_name: file_name.into(),
            file,
        });
        self
    }

    /// Serialize the body. Fails when no part was added.
    pub fn encode(&self) -> Result<Vec<u8>, DkgError> {
        if self.parts.is_empty() {
            return Err(DkgError::Validation(
                "must have at least one part to build multipart message".to_string(),
            ));
        }

        let mut out = Vec::new();
        for part in &self.parts {
            match part {
                Part::Text {
                    name,
                    value,
                    content_type,
                } => {
                    out.extend_from_slice(self.disposition(name).as_bytes());
                    out.extend_from_slice(b"\r\n");
                    if let Some(content_type) = content_type {
                        out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
                    }
                    out.extend_from_slice(b"\r\n");
                    out.extend_from_slice(value.as_bytes());
                    out.extend_from_slice(b"\r\n");
                }
                Part::File {
                    name,
                    file_name,
                    file,
                } => {
                    out.extend_from_slice(self.disposition(name).as_bytes());
                    out.extend_from_slice(format!("; filename={file_name}\r\n").as_bytes());
                    out.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
                    out.extend_from_slice(&file.data);
                    out.extend_from_slice(b"\r\n");
                }
            }
        }
        out.extend_from_slice(format!("--{}--", self.boundary).as_bytes());
        Ok(out)
    }

    fn disposition(&self, name: &str) -> String {
        format!("--{}\r\nContent-Disposition: form-data; name={name}", self.boundary)
    }
}
