//! Role-based access decisions for protected views.
//!
//! [`evaluate`] is a pure function of the session state and the role a view
//! requires. It has no side effects, no clock, and no randomness: identical
//! inputs always yield identical decisions, which is what makes route
//! guarding trivially testable. Redirects are decisions only - performing
//! the navigation is the caller's job.

use bazaar_core::Role;

use crate::session::SessionState;

/// Where to send a denied visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Unauthenticated visitors go to the login view.
    Login,
    /// Authenticated visitors lacking the required role go home.
    Home,
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The session is still resolving; show a neutral loading view and check
    /// again after the next transition.
    Pending,
    /// Render the protected view.
    Allow,
    /// Redirect instead of rendering.
    Deny(Redirect),
}

/// Decide whether the current session may reach a protected view.
///
/// `required` is the role the view demands; `None` means any authenticated
/// user qualifies. `Admin` passes every role requirement (a superset
/// capability, not a hierarchy - there is no seller/buyer relation).
#[must_use]
pub fn evaluate(state: &SessionState, required: Option<Role>) -> Access {
    match state {
        SessionState::Resolving => Access::Pending,
        SessionState::Unauthenticated => Access::Deny(Redirect::Login),
        SessionState::Authenticated(session) => match required {
            None => Access::Allow,
            Some(role) if session.identity.role == role || session.identity.role == Role::Admin => {
                Access::Allow
            }
            Some(_) => Access::Deny(Redirect::Home),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::Identity;
    use crate::session::Session;
    use bazaar_core::{AccessToken, Email, UserId};

    fn authenticated(role: Role) -> SessionState {
        SessionState::Authenticated(Session {
            identity: Identity {
                id: UserId::random(),
                username: "tester".to_string(),
                email: Email::parse("tester@example.com").unwrap(),
                role,
            },
            token: AccessToken::new("tok"),
        })
    }

    #[test]
    fn test_resolving_is_pending() {
        assert_eq!(evaluate(&SessionState::Resolving, None), Access::Pending);
        assert_eq!(
            evaluate(&SessionState::Resolving, Some(Role::Admin)),
            Access::Pending
        );
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        for required in [None, Some(Role::Buyer), Some(Role::Seller), Some(Role::Admin)] {
            assert_eq!(
                evaluate(&SessionState::Unauthenticated, required),
                Access::Deny(Redirect::Login)
            );
        }
    }

    #[test]
    fn test_matching_role_is_allowed() {
        assert_eq!(
            evaluate(&authenticated(Role::Seller), Some(Role::Seller)),
            Access::Allow
        );
        assert_eq!(
            evaluate(&authenticated(Role::Buyer), Some(Role::Buyer)),
            Access::Allow
        );
    }

    #[test]
    fn test_mismatched_role_redirects_home() {
        assert_eq!(
            evaluate(&authenticated(Role::Seller), Some(Role::Admin)),
            Access::Deny(Redirect::Home)
        );
        assert_eq!(
            evaluate(&authenticated(Role::Buyer), Some(Role::Seller)),
            Access::Deny(Redirect::Home)
        );
        // No seller/buyer hierarchy in either direction.
        assert_eq!(
            evaluate(&authenticated(Role::Seller), Some(Role::Buyer)),
            Access::Deny(Redirect::Home)
        );
    }

    #[test]
    fn test_admin_passes_every_requirement() {
        for required in [None, Some(Role::Buyer), Some(Role::Seller), Some(Role::Admin)] {
            assert_eq!(evaluate(&authenticated(Role::Admin), required), Access::Allow);
        }
    }

    #[test]
    fn test_no_required_role_needs_only_authentication() {
        assert_eq!(evaluate(&authenticated(Role::Buyer), None), Access::Allow);
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let state = authenticated(Role::Seller);
        let first = evaluate(&state, Some(Role::Seller));
        for _ in 0..10 {
            assert_eq!(evaluate(&state, Some(Role::Seller)), first);
        }
    }
}
