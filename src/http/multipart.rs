//! Pre-built multipart/form-data payloads.

use std::fmt::Write as _;

/// Media type forced on form uploads.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Content type used for file parts whose declared type is unusable.
pub const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone)]
enum Part {
    Field {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        mime: String,
        data: Vec<u8>,
    },
}

/// A multipart form whose body is encoded once, before the request is built.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("gamelink-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Use a fixed boundary (tests, reproducible payloads).
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Add a text field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a binary file part.
    ///
    /// A `mime` that is empty or holds control characters is replaced by
    /// `application/octet-stream`, so it can never start a new header line.
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        mime: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.parts.push(Part::File {
            name: name.into(),
            filename: filename.into(),
            mime: part_mime(mime.into()),
            data,
        });
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// `multipart/form-data` with this form's boundary parameter.
    pub fn content_type(&self) -> String {
        format!("{MULTIPART_FORM_DATA}; boundary={}", self.boundary)
    }

    /// Encode the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            let mut head = String::new();
            let _ = write!(head, "--{}\r\n", self.boundary);
            match part {
                Part::Field { name, value } => {
                    let _ = write!(
                        head,
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        escape_quoted(name)
                    );
                    out.extend_from_slice(head.as_bytes());
                    out.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    filename,
                    mime,
                    data,
                } => {
                    let _ = write!(
                        head,
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        escape_quoted(name),
                        escape_quoted(filename),
                        mime
                    );
                    out.extend_from_slice(head.as_bytes());
                    out.extend_from_slice(data);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

fn part_mime(mime: String) -> String {
    if mime.trim().is_empty() || mime.chars().any(char::is_control) {
        tracing::warn!(mime = ?mime, "Unusable file part content type, sending {OCTET_STREAM}");
        return OCTET_STREAM.to_string();
    }
    mime
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
