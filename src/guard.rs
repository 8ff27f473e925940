//! Route guard for protected views.
//!
//! Evaluated by the composition root before a protected view is
//! constructed, so unauthenticated sessions never see a flash of
//! protected content. Two-phase machine: `Checking` on mount, then
//! settled in `Authorized` or `Redirecting`. The redirect instruction
//! is issued exactly once per mount; a later authentication change
//! settles the machine again.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized,
    Redirecting,
}

/// What the caller must do after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Construct and show the protected view
    Allow,
    /// Clear stale user state and navigate to the login view, once
    RedirectToLogin,
    /// Navigation already issued for this mount; do nothing
    Hold,
}

pub struct RouteGuard {
    state: GuardState,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            state: GuardState::Checking,
        }
    }

    /// Settle the guard against the current authenticated flag.
    /// Transitions are keyed on the flag changing, not on render
    /// count: repeated evaluation in the same state is idempotent.
    pub fn evaluate(&mut self, authenticated: bool) -> GuardDecision {
        match (self.state, authenticated) {
            (GuardState::Checking, true) | (GuardState::Redirecting, true) => {
                self.state = GuardState::Authorized;
                GuardDecision::Allow
            }
            (GuardState::Checking, false) | (GuardState::Authorized, false) => {
                self.state = GuardState::Redirecting;
                GuardDecision::RedirectToLogin
            }
            (GuardState::Authorized, true) => GuardDecision::Allow,
            (GuardState::Redirecting, false) => GuardDecision::Hold,
        }
    }

    /// Reset to `Checking`, as on a fresh mount of the protected
    /// layout.
    pub fn remount(&mut self) {
        self.state = GuardState::Checking;
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticated_mount_is_allowed() {
        let mut guard = RouteGuard::new();
        assert_eq!(guard.evaluate(true), GuardDecision::Allow);
        assert_eq!(guard.evaluate(true), GuardDecision::Allow);
    }

    #[test]
    fn test_unauthenticated_mount_redirects_exactly_once() {
        let mut guard = RouteGuard::new();
        assert_eq!(guard.evaluate(false), GuardDecision::RedirectToLogin);

        // Re-evaluation during the same mount must not navigate again
        assert_eq!(guard.evaluate(false), GuardDecision::Hold);
        assert_eq!(guard.evaluate(false), GuardDecision::Hold);
    }

    #[test]
    fn test_logout_after_authorized_redirects_again() {
        let mut guard = RouteGuard::new();
        assert_eq!(guard.evaluate(true), GuardDecision::Allow);

        // Flag identity changed: one new redirect, then holds
        assert_eq!(guard.evaluate(false), GuardDecision::RedirectToLogin);
        assert_eq!(guard.evaluate(false), GuardDecision::Hold);
    }

    #[test]
    fn test_login_while_redirecting_authorizes() {
        let mut guard = RouteGuard::new();
        guard.evaluate(false);
        assert_eq!(guard.evaluate(true), GuardDecision::Allow);
    }

    #[test]
    fn test_remount_resets_the_one_shot_redirect() {
        let mut guard = RouteGuard::new();
        guard.evaluate(false);
        assert_eq!(guard.evaluate(false), GuardDecision::Hold);

        // Fresh mount gets a fresh one-shot redirect
        guard.remount();
        assert_eq!(guard.evaluate(false), GuardDecision::RedirectToLogin);
    }
}
