//! Role checks and the deny-recovery response.
//!
//! `authorize` is a pure function of the principal and the requirement; the
//! redirect built for a denial is a plain function of the denied URL. Nothing
//! here unwinds through exceptions, so the mapping applies uniformly no
//! matter which handler the denial happened in front of.

use axum::response::{IntoResponse, Redirect, Response};

use super::principal::{Principal, Role};

/// What a route requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// No principal needed.
    Public,
    /// Any authenticated principal.
    AnyAuthenticated,
    /// A principal holding the named role.
    HasRole(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Decide whether the (possibly absent) principal satisfies the requirement.
#[must_use]
pub fn authorize(principal: Option<&Principal>, required: RoleRequirement) -> Decision {
    match required {
        RoleRequirement::Public => Decision::Allow,
        RoleRequirement::AnyAuthenticated => {
            if principal.is_some() {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        RoleRequirement::HasRole(role) => match principal {
            Some(principal) if principal.has_role(role) => Decision::Allow,
            _ => Decision::Deny,
        },
    }
}

/// `303 See Other` back to the denied URL with the forbidden marker appended;
/// the view layer renders the error banner from the query parameter.
#[must_use]
pub fn forbidden_redirect(original_url: &str) -> Response {
    let separator = if original_url.contains('?') { '&' } else { '?' };
    let location = format!("{original_url}{separator}error=forbidden");
    Redirect::to(&location).into_response()
}
