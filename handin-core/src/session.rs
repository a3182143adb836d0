//! Session state machine
//!
//! A session is one login → submit → logout exchange. It decides which
//! request goes out next and interprets each response buffer, but does no
//! I/O itself: the caller sends what [`Session::next_request`] returns and
//! feeds whatever comes back into [`Session::handle_response`].

use std::fmt;

use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    frame::{Request, ResponseBody},
    scanner::FrameScanner,
};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing sent yet
    Idle,

    /// Login sent, awaiting acknowledgement
    LoggingIn,

    /// Login accepted
    LoggedIn,

    /// Submission sent, awaiting token
    Submitting,

    /// Token received
    Submitted,

    /// Logout sent, awaiting reason
    LoggingOut,

    /// Exchange complete
    Done,

    /// Exchange aborted
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Values sent over the course of a session
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub name: String,
    pub repo: String,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("repo", &self.repo)
            .finish()
    }
}

/// What a successfully handled response achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    LoggedIn,
    Submitted { token: String },
    LoggedOut { reason: String },
}

/// One login → submit → logout exchange
#[derive(Debug, Clone)]
pub struct Session {
    credentials: Credentials,
    state: SessionState,
    token: Option<String>,
    logout_reason: Option<String>,
    failure: Option<String>,
    failed_during: Option<SessionState>,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: SessionState::Idle,
            token: None,
            logout_reason: None,
            failure: None,
            failed_during: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the session reached `Done` or `Failed`
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Token from the submission acknowledgement
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Reason text from the logout acknowledgement
    pub fn logout_reason(&self) -> Option<&str> {
        self.logout_reason.as_deref()
    }

    /// Why the session failed
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// State the session was in when it failed
    pub fn failed_during(&self) -> Option<SessionState> {
        self.failed_during
    }

    /// Advance to the next sending state and return the request to send
    ///
    /// `Idle` sends the login, `LoggedIn` the submission and `Submitted`
    /// the logout.
    pub fn next_request(&mut self) -> Result<Request> {
        let creds = &self.credentials;

        let (request, next) = match self.state {
            SessionState::Idle => (
                Request::login(&creds.email, &creds.password),
                SessionState::LoggingIn,
            ),
            SessionState::LoggedIn => (
                Request::submission(&creds.name, &creds.email, &creds.repo),
                SessionState::Submitting,
            ),
            SessionState::Submitted => (Request::Logout, SessionState::LoggingOut),
            state => {
                return Err(Error::InvalidSessionState(format!(
                    "No request to send from state: {:?}",
                    state
                )));
            }
        };

        self.transition(next);
        Ok(request)
    }

    /// Interpret the response to the request in flight
    ///
    /// On error the session moves to `Failed`, except when called from a
    /// state that awaits no response.
    pub fn handle_response(&mut self, buf: &[u8]) -> Result<Outcome> {
        let result = match self.state {
            SessionState::LoggingIn => Self::settle_login(buf),
            SessionState::Submitting => Self::settle_submission(buf),
            SessionState::LoggingOut => Self::settle_logout(buf),
            state => {
                return Err(Error::InvalidSessionState(format!(
                    "No response expected in state: {:?}",
                    state
                )));
            }
        };

        match result {
            Ok(outcome) => {
                match &outcome {
                    Outcome::LoggedIn => {
                        info!("Login success");
                        self.transition(SessionState::LoggedIn);
                    }
                    Outcome::Submitted { token } => {
                        info!(token = %token, "Submission success");
                        self.token = Some(token.clone());
                        self.transition(SessionState::Submitted);
                    }
                    Outcome::LoggedOut { reason } => {
                        info!(reason = %reason, "Logged out");
                        self.logout_reason = Some(reason.clone());
                        self.transition(SessionState::Done);
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                self.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Check whether `buf` already decides the response in flight
    ///
    /// True once a whole frame in `buf` accepts or rejects the step, so
    /// bytes trailing it need not be waited for. Does not change state.
    pub fn is_settled_by(&self, buf: &[u8]) -> bool {
        let result = match self.state {
            SessionState::LoggingIn => Self::settle_login(buf),
            SessionState::Submitting => Self::settle_submission(buf),
            SessionState::LoggingOut => Self::settle_logout(buf),
            _ => return false,
        };

        !matches!(result, Err(Error::MissingResponse { .. }))
    }

    /// Abort the session
    ///
    /// No effect once the session is finished.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.is_finished() {
            return;
        }

        let reason = reason.into();
        warn!(state = ?self.state, reason = %reason, "Session failed");
        self.failure = Some(reason);
        self.failed_during = Some(self.state);
        self.state = SessionState::Failed;
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Session transition");
        self.state = next;
    }

    // The first frame that accepts or rejects decides the step.
    fn settle_login(buf: &[u8]) -> Result<Outcome> {
        for body in Self::bodies(buf) {
            match body {
                ResponseBody::LoginAccepted => return Ok(Outcome::LoggedIn),
                ResponseBody::Rejected { reason } => return Err(Error::Rejected { reason }),
                ResponseBody::SubmissionAccepted { .. } => {
                    debug!("Ignoring submission acknowledgement during login");
                }
            }
        }

        Err(Error::MissingResponse {
            expected: "login acknowledgement",
        })
    }

    fn settle_submission(buf: &[u8]) -> Result<Outcome> {
        for body in Self::bodies(buf) {
            match body {
                ResponseBody::SubmissionAccepted { token } => {
                    return Ok(Outcome::Submitted { token });
                }
                ResponseBody::Rejected { reason } => return Err(Error::Rejected { reason }),
                ResponseBody::LoginAccepted => {
                    debug!("Ignoring login acknowledgement during submission");
                }
            }
        }

        Err(Error::MissingResponse {
            expected: "submission acknowledgement",
        })
    }

    // The reason frame doubles as the logout acknowledgement.
    fn settle_logout(buf: &[u8]) -> Result<Outcome> {
        Self::bodies(buf)
            .find_map(|body| match body {
                ResponseBody::Rejected { reason } => Some(Outcome::LoggedOut { reason }),
                _ => None,
            })
            .ok_or(Error::MissingResponse {
                expected: "logout reason",
            })
    }

    fn bodies(buf: &[u8]) -> impl Iterator<Item = ResponseBody> + '_ {
        FrameScanner::new(buf).filter_map(|item| match item {
            Ok(frame) => Some(frame.body),
            Err(e) => {
                warn!("Discarded response frame: {}", e);
                None
            }
        })
    }
}
