use crate::components::google_calendar::CalendarEvent;

/// Screen phases of the single user session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No sign-in has completed; the landing page shows the sign-in button
    Unauthenticated,
    /// The browser has been sent to the consent screen
    Authenticating,
    /// Sign-in completed, event fetch still in flight
    AuthenticatedLoading,
    /// Events (possibly none) are available for rendering
    AuthenticatedReady,
}

/// In-memory state for the single user session.
///
/// Mutated only by the bootstrapper and the auth/fetch handlers; the derived
/// table view never writes back into it.
#[derive(Debug)]
pub struct Session {
    initialized: bool,
    phase: SessionPhase,
    user_email: Option<String>,
    pending_auth_state: Option<String>,
    events: Vec<CalendarEvent>,
}

impl Session {
    /// Create a fresh session, as at application start
    pub fn new() -> Self {
        Self {
            initialized: false,
            phase: SessionPhase::Unauthenticated,
            user_email: None,
            pending_auth_state: None,
            events: Vec::new(),
        }
    }

    /// Flip the readiness flag once component initialization succeeded
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Whether the vendor client finished initializing
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether sign-in has completed
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::AuthenticatedLoading | SessionPhase::AuthenticatedReady
        )
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    /// The full fetched event list, newest first
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Start the interactive sign-in flow.
    ///
    /// A no-op returning false unless initialization succeeded and no sign-in
    /// is already underway or complete.
    pub fn begin_sign_in(&mut self, state_token: String) -> bool {
        if !self.initialized || self.phase != SessionPhase::Unauthenticated {
            return false;
        }
        self.pending_auth_state = Some(state_token);
        self.phase = SessionPhase::Authenticating;
        true
    }

    /// Take the CSRF state token stored when the sign-in flow started
    pub fn take_pending_auth_state(&mut self) -> Option<String> {
        self.pending_auth_state.take()
    }

    /// Roll back to the unauthenticated state, committing nothing
    pub fn sign_in_failed(&mut self) {
        self.pending_auth_state = None;
        self.user_email = None;
        self.events.clear();
        self.phase = SessionPhase::Unauthenticated;
    }

    /// Record the authenticated identity; the event fetch follows
    pub fn sign_in_succeeded(&mut self, email: String) -> bool {
        if self.phase != SessionPhase::Authenticating {
            return false;
        }
        self.user_email = Some(email);
        self.phase = SessionPhase::AuthenticatedLoading;
        true
    }

    /// Store the fetched events and mark the screen ready.
    ///
    /// Called with an empty list when the fetch failed, so the table renders
    /// empty instead of surfacing an error.
    pub fn fetch_complete(&mut self, events: Vec<CalendarEvent>) -> bool {
        if self.phase != SessionPhase::AuthenticatedLoading {
            return false;
        }
        self.events = events;
        self.phase = SessionPhase::AuthenticatedReady;
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_is_noop_before_initialization() {
        let mut session = Session::new();
        assert!(!session.begin_sign_in("state".to_string()));
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
        assert!(session.take_pending_auth_state().is_none());
    }

    #[test]
    fn happy_path_transitions() {
        let mut session = Session::new();
        session.mark_initialized();

        assert!(session.begin_sign_in("abc".to_string()));
        assert_eq!(session.phase(), SessionPhase::Authenticating);
        assert_eq!(session.take_pending_auth_state().as_deref(), Some("abc"));

        assert!(session.sign_in_succeeded("user@example.com".to_string()));
        assert_eq!(session.phase(), SessionPhase::AuthenticatedLoading);
        assert!(session.is_authenticated());

        assert!(session.fetch_complete(Vec::new()));
        assert_eq!(session.phase(), SessionPhase::AuthenticatedReady);
        assert_eq!(session.user_email(), Some("user@example.com"));
        assert!(session.events().is_empty());
    }

    #[test]
    fn sign_in_failure_commits_nothing() {
        let mut session = Session::new();
        session.mark_initialized();
        assert!(session.begin_sign_in("abc".to_string()));

        session.sign_in_failed();
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
        assert!(session.user_email().is_none());
        assert!(session.take_pending_auth_state().is_none());

        // A fetch result arriving after a failure must not flip the screen
        assert!(!session.fetch_complete(Vec::new()));
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
    }

    #[test]
    fn second_sign_in_attempt_is_rejected_while_authenticating() {
        let mut session = Session::new();
        session.mark_initialized();
        assert!(session.begin_sign_in("first".to_string()));
        assert!(!session.begin_sign_in("second".to_string()));
        assert_eq!(session.take_pending_auth_state().as_deref(), Some("first"));
    }

    #[test]
    fn sign_in_succeeded_requires_authenticating_phase() {
        let mut session = Session::new();
        session.mark_initialized();
        assert!(!session.sign_in_succeeded("user@example.com".to_string()));
        assert_eq!(session.phase(), SessionPhase::Unauthenticated);
    }
}
