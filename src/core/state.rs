//! Session lifecycle phases.
//!
//! `Init -> Normal -> Quitting (-> Quitting)`; nothing else is legal.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Init,
    Normal,
    Quitting,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Init => "Init",
            SessionState::Normal => "Normal",
            SessionState::Quitting => "Quitting",
        }
    }

    /// Legacy numeric code. Codes were powers of two; only these three were
    /// ever live phases.
    pub fn code(self) -> u32 {
        match self {
            SessionState::Init => 1,
            SessionState::Normal => 4,
            SessionState::Quitting => 128,
        }
    }

    pub fn from_code(code: u32) -> Result<Self, InvalidStateValue> {
        match code {
            1 => Ok(SessionState::Init),
            4 => Ok(SessionState::Normal),
            128 => Ok(SessionState::Quitting),
            other => Err(InvalidStateValue::Code(other)),
        }
    }

    /// Phases in which a completion round is requested.
    pub fn requests_completion(self) -> bool {
        matches!(self, SessionState::Normal | SessionState::Quitting)
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Init, SessionState::Normal)
                | (SessionState::Normal, SessionState::Quitting)
                | (SessionState::Quitting, SessionState::Quitting)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = InvalidStateValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Init" | "AppInit" => Ok(SessionState::Init),
            "Normal" => Ok(SessionState::Normal),
            "Quitting" => Ok(SessionState::Quitting),
            other => Err(InvalidStateValue::Name(other.to_string())),
        }
    }
}

/// An attempt to set a phase that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidStateValue {
    Code(u32),
    Name(String),
}

impl fmt::Display for InvalidStateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidStateValue::Code(code) => write!(f, "Invalid session state value {code}"),
            InvalidStateValue::Name(name) => write!(f, "Invalid session state name '{name}'"),
        }
    }
}

impl std::error::Error for InvalidStateValue {}

/// Failure conditions the old flag set reserved next to the phases. They are
/// faults, not phases, and never enter the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFault {
    Client,
    Api,
}

impl fmt::Display for SessionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFault::Client => f.write_str("client error"),
            SessionFault::Api => f.write_str("API error"),
        }
    }
}

#[derive(Debug, Default)]
pub struct StateMachine {
    state: SessionState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SessionState {
        self.state
    }

    pub fn is(&self, state: SessionState) -> bool {
        self.state == state
    }

    /// Move to `next` if the transition is legal. Illegal transitions leave
    /// the phase untouched and return `false`.
    pub fn transition(&mut self, next: SessionState) -> bool {
        if self.state.can_transition_to(next) {
            debug!(from = %self.state, to = %next, "session state transition");
            self.state = next;
            true
        } else {
            warn!(from = %self.state, to = %next, "refusing illegal session state transition");
            false
        }
    }

    /// Set the phase from a legacy numeric code. A known phase goes through
    /// [`StateMachine::transition`], so an illegal move is refused and the
    /// phase in effect is returned. Unknown codes revert to `Init` and hand
    /// the diagnostic back to the caller.
    pub fn set_code(&mut self, code: u32) -> Result<SessionState, InvalidStateValue> {
        self.apply_parsed(SessionState::from_code(code))
    }

    /// Set the phase by name. Unknown names revert to `Init`.
    pub fn set_named(&mut self, name: &str) -> Result<SessionState, InvalidStateValue> {
        self.apply_parsed(name.parse())
    }

    fn apply_parsed(
        &mut self,
        parsed: Result<SessionState, InvalidStateValue>,
    ) -> Result<SessionState, InvalidStateValue> {
        match parsed {
            Ok(state) => {
                self.transition(state);
                Ok(self.state)
            }
            Err(err) => {
                warn!("{err}. Using default state.");
                self.state = SessionState::Init;
                Err(err)
            }
        }
    }
}
