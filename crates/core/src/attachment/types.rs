//! Attachment types and data structures.

use serde::{Deserialize, Serialize};

use crate::path;

/// Stable identifier of an attachment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(pub i64);

impl AttachmentId {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AttachmentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<i64> for AttachmentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Which storage partition an attachment belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Reachable without logging in.
    Public,
    /// Requires an authenticated requester.
    Private,
}

impl Visibility {
    /// Maps the stored `is_private` flag to a visibility.
    #[must_use]
    pub const fn from_private(is_private: bool) -> Self {
        if is_private { Self::Private } else { Self::Public }
    }

    /// Whether this is the private partition.
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::Private => "private",
        })
    }
}

/// A derived rendition of the primary file, stored next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Rendition name, e.g. `thumbnail`.
    pub name: String,
    /// File name inside the primary file's directory.
    pub file: String,
}

impl Variant {
    /// Create a variant.
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }
}

/// Attachment domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier.
    pub id: AttachmentId,
    /// Human-readable name used for lookups by name.
    pub slug: String,
    /// Primary file path relative to the upload root. Authoritative location.
    pub attached_path: String,
    /// Derived files, in rendition order.
    #[serde(default)]
    pub variants: Vec<Variant>,
    /// Visibility flag. Absent means public.
    #[serde(default)]
    pub is_private: bool,
    /// Content type used when serving.
    pub mime_type: String,
}

impl Attachment {
    /// Create a public attachment without variants.
    #[must_use]
    pub fn new(
        id: impl Into<AttachmentId>,
        slug: impl Into<String>,
        attached_path: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            attached_path: attached_path.into(),
            variants: Vec::new(),
            is_private: false,
            mime_type: mime_type.into(),
        }
    }

    /// Add a variant.
    #[must_use]
    pub fn with_variant(mut self, name: impl Into<String>, file: impl Into<String>) -> Self {
        self.variants.push(Variant::new(name, file));
        self
    }

    /// Set the visibility flag.
    #[must_use]
    pub fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }

    /// Current visibility.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        Visibility::from_private(self.is_private)
    }

    /// Whether the record points at a primary file at all.
    #[must_use]
    pub fn has_file(&self) -> bool {
        !self.attached_path.is_empty()
    }

    /// Base name of the primary file.
    #[must_use]
    pub fn file_name(&self) -> &str {
        path::basename(&self.attached_path)
    }

    /// Directory holding the primary file and its variants.
    #[must_use]
    pub fn directory(&self) -> &str {
        path::dirname(&self.attached_path)
    }

    /// Paths of every variant, relative to the upload root.
    #[must_use]
    pub fn variant_paths(&self) -> Vec<String> {
        self.variants
            .iter()
            .map(|v| path::join(self.directory(), &v.file))
            .collect()
    }

    /// Whether `name` identifies this attachment (slug or primary file name).
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.slug == name || (self.has_file() && self.file_name() == name)
    }
}
