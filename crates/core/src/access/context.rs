//! Per-request caller context.

use serde::{Deserialize, Serialize};

use crate::attachment::VisibilityConstraint;

/// Explicit listing toggle chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisibilityFilter {
    /// Only public attachments.
    #[serde(rename = "public")]
    OnlyPublic,
    /// Only private attachments.
    #[serde(rename = "private")]
    OnlyPrivate,
}

impl std::str::FromStr for VisibilityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::OnlyPublic),
            "private" => Ok(Self::OnlyPrivate),
            other => Err(format!("unknown visibility filter: {other}")),
        }
    }
}

/// Everything a decision needs to know about the incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestContext {
    /// Requester is logged in.
    pub is_authenticated: bool,
    /// Administrative listing rather than a public-facing fetch.
    pub is_admin_context: bool,
    /// Explicit "only public" / "only private" toggle.
    pub explicit_visibility_filter: Option<VisibilityFilter>,
}

impl RequestContext {
    /// Public-facing request.
    #[must_use]
    pub const fn front_end(is_authenticated: bool) -> Self {
        Self {
            is_authenticated,
            is_admin_context: false,
            explicit_visibility_filter: None,
        }
    }

    /// Administrative request.
    #[must_use]
    pub const fn admin(is_authenticated: bool) -> Self {
        Self {
            is_authenticated,
            is_admin_context: true,
            explicit_visibility_filter: None,
        }
    }

    /// Set the explicit listing toggle.
    #[must_use]
    pub const fn with_filter(mut self, filter: Option<VisibilityFilter>) -> Self {
        self.explicit_visibility_filter = filter;
        self
    }

    /// Partition a collection listing may return for this caller.
    ///
    /// Public only unless an authenticated caller asks for the private side.
    #[must_use]
    pub const fn listing_constraint(&self) -> VisibilityConstraint {
        match self.explicit_visibility_filter {
            Some(VisibilityFilter::OnlyPrivate) if self.is_authenticated => {
                VisibilityConstraint::PrivateOnly
            }
            _ => VisibilityConstraint::PublicOnly,
        }
    }
}
