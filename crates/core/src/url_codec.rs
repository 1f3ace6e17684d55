//! Public URLs for attachments.
//!
//! Private attachments are addressed as `{base}/private-files/{id}/{name}`.
//! Only the id locates the file; the trailing name is cosmetic and never
//! checked against the real file. The name is percent-encoded as a single
//! path segment.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::attachment::{Attachment, AttachmentId};

/// Path segment routed to the file-serving handler.
pub const PRIVATE_FILES_SEGMENT: &str = "private-files";

static PRIVATE_FILES_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|/)private-files/(?P<rest>.*)$").expect("valid regex"));

static ID_AND_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<id>[0-9]+)(?:/(?P<name>[^?#]*))?(?:[?#].*)?$").expect("valid regex")
});

static LEGACY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[?&/])file_id=(?P<id>[0-9]+)").expect("valid regex"));

static LEGACY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[?&/])file_name=(?P<name>[^&#]*)").expect("valid regex"));

/// Reasons a request path does not name an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Path is not under `private-files/`.
    #[error("not a private-files path")]
    NoMatch,
    /// Path is under `private-files/` but carries no usable id.
    #[error("private-files path without a file id")]
    MissingId,
}

/// A URL handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicUrl(String);

impl PublicUrl {
    /// Full URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path part, without scheme and host.
    #[must_use]
    pub fn path(&self) -> &str {
        let after_scheme = self.0.find("://").map_or(0, |idx| idx + 3);
        self.0[after_scheme..]
            .find('/')
            .map_or("/", |idx| &self.0[after_scheme + idx..])
    }

    /// Consume into the URL string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PublicUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attachment named by a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Authoritative locator.
    pub id: AttachmentId,
    /// Cosmetic file name, when the path carried one.
    pub file_name: Option<String>,
}

/// Encodes attachments into URLs and decodes request paths back.
#[derive(Debug, Clone)]
pub struct UrlCodec {
    base_url: String,
}

impl UrlCodec {
    /// Create a codec for the upload tree's public base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    /// Public base URL, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path part of the base URL, without trailing slash. `""` at the site root.
    ///
    /// The file-serving route is mounted at `{mount_path}/private-files/`.
    #[must_use]
    pub fn mount_path(&self) -> &str {
        let after_scheme = self.base_url.find("://").map_or(0, |idx| idx + 3);
        self.base_url[after_scheme..]
            .find('/')
            .map_or("", |idx| &self.base_url[after_scheme + idx..])
    }

    /// URL clients should use for `attachment`.
    ///
    /// Private attachments get the obscured `private-files` URL; public ones
    /// keep their direct location.
    #[must_use]
    pub fn encode(&self, attachment: &Attachment) -> PublicUrl {
        if attachment.is_private {
            PublicUrl(format!(
                "{}/{PRIVATE_FILES_SEGMENT}/{}/{}",
                self.base_url,
                attachment.id,
                urlencoding::encode(attachment.file_name())
            ))
        } else {
            PublicUrl(format!("{}/{}", self.base_url, attachment.attached_path))
        }
    }

    /// Parse `.../private-files/<id>/<name>` into an attachment reference.
    ///
    /// Falls back to `file_id=` / `file_name=` tokens for links produced
    /// by the old query-style rewrite.
    pub fn decode(&self, request_path: &str) -> Result<AttachmentRef, DecodeError> {
        let rest = PRIVATE_FILES_PATH
            .captures(request_path)
            .and_then(|c| c.name("rest"))
            .map(|m| m.as_str())
            .ok_or(DecodeError::NoMatch)?;

        if let Some(caps) = ID_AND_NAME.captures(rest) {
            if let Some(id) = caps.name("id").and_then(|m| m.as_str().parse().ok()) {
                return Ok(AttachmentRef {
                    id,
                    file_name: caps
                        .name("name")
                        .map(|m| m.as_str().trim_end_matches('/'))
                        .filter(|name| !name.is_empty())
                        .map(decode_name),
                });
            }
        }

        let id = LEGACY_ID
            .captures(rest)
            .and_then(|c| c.name("id"))
            .and_then(|m| m.as_str().parse().ok())
            .ok_or(DecodeError::MissingId)?;
        let file_name = LEGACY_NAME
            .captures(rest)
            .and_then(|c| c.name("name"))
            .map(|m| m.as_str())
            .filter(|name| !name.is_empty())
            .map(decode_name);

        Ok(AttachmentRef { id, file_name })
    }
}

/// Percent-decode a cosmetic name; malformed escapes are kept verbatim.
fn decode_name(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), std::borrow::Cow::into_owned)
}
