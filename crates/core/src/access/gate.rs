//! Serve / redirect / not-found decisions.

use tracing::debug;

use super::context::RequestContext;
use crate::attachment::Attachment;

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessDecision {
    /// Stream the file.
    Serve,
    /// Send the requester through the login flow.
    Redirect,
    /// Pretend the record does not exist.
    NotFound,
}

/// Where the decision will be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServingContext {
    /// Raw file fetch through a private-files URL.
    FileFetch,
    /// Front-end listing or single-record detail.
    Listing,
}

/// Stateless authorization for private files.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    /// Decision table for a raw file fetch; first match wins.
    ///
    /// | file_found | is_private | is_authenticated | decision |
    /// |---|---|---|---|
    /// | false | - | - | Redirect |
    /// | true | true | false | Redirect |
    /// | true | - | - | Serve |
    ///
    /// A missing record redirects instead of 404ing so that fetches do not
    /// reveal which ids exist.
    #[must_use]
    pub const fn decide(file_found: bool, is_private: bool, is_authenticated: bool) -> AccessDecision {
        if !file_found {
            return AccessDecision::Redirect;
        }
        if is_private && !is_authenticated {
            return AccessDecision::Redirect;
        }
        AccessDecision::Serve
    }

    /// Whether the requester may see the attachment at all.
    #[must_use]
    pub fn can_view(attachment: Option<&Attachment>, ctx: &RequestContext) -> bool {
        match attachment {
            Some(a) => {
                Self::decide(a.has_file(), a.is_private, ctx.is_authenticated)
                    == AccessDecision::Serve
            }
            None => false,
        }
    }

    /// Decision for `attachment` presented in `serving`.
    ///
    /// Listings realize a denial as not-found, fetches as a login redirect.
    #[must_use]
    pub fn decide_for(
        attachment: Option<&Attachment>,
        ctx: &RequestContext,
        serving: ServingContext,
    ) -> AccessDecision {
        let decision = match attachment {
            Some(a) => Self::decide(a.has_file(), a.is_private, ctx.is_authenticated),
            None => Self::decide(false, false, ctx.is_authenticated),
        };

        if decision != AccessDecision::Serve {
            debug!(
                attachment_id = attachment.map(|a| a.id.0),
                authenticated = ctx.is_authenticated,
                ?serving,
                "access denied"
            );
        }

        match (decision, serving) {
            (AccessDecision::Redirect, ServingContext::Listing) => AccessDecision::NotFound,
            _ => decision,
        }
    }
}
