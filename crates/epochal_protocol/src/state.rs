//! Connection phase state machine.

use std::fmt;

use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::version::ProtocolVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ConnectionPhase {
    #[default]
    Handshake,
    Status,
    Login,
    /// 1.20.2 onwards, between login and play.
    Configuration,
    Play,
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionPhase::Handshake => "handshake",
            ConnectionPhase::Status => "status",
            ConnectionPhase::Login => "login",
            ConnectionPhase::Configuration => "configuration",
            ConnectionPhase::Play => "play",
        };
        f.write_str(name)
    }
}

/// Next-state field of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeIntent {
    Status,
    Login,
    /// Login after a server transfer, 1.20.5 onwards.
    Transfer,
}

impl HandshakeIntent {
    pub const STATUS: i32 = 1;
    pub const LOGIN: i32 = 2;
    pub const TRANSFER: i32 = 3;

    pub fn from_id(id: i32, version: ProtocolVersion) -> Result<Self> {
        match id {
            Self::STATUS => Ok(HandshakeIntent::Status),
            Self::LOGIN => Ok(HandshakeIntent::Login),
            Self::TRANSFER if version >= ProtocolVersion::V1_20_5 => Ok(HandshakeIntent::Transfer),
            other => Err(ProtocolError::invalid_value("handshake next state", other)),
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            HandshakeIntent::Status => Self::STATUS,
            HandshakeIntent::Login => Self::LOGIN,
            HandshakeIntent::Transfer => Self::TRANSFER,
        }
    }

    pub fn target_phase(&self) -> ConnectionPhase {
        match self {
            HandshakeIntent::Status => ConnectionPhase::Status,
            HandshakeIntent::Login | HandshakeIntent::Transfer => ConnectionPhase::Login,
        }
    }
}

/// Tracks the phase of one connection and the version fixed by its handshake.
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    phase: ConnectionPhase,
    version: Option<ProtocolVersion>,
    login_success_sent: bool,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn version(&self) -> Option<ProtocolVersion> {
        self.version
    }

    fn transition(&mut self, to: ConnectionPhase) {
        debug!(from = %self.phase, to = %to, "Connection phase transition");
        self.phase = to;
    }

    fn invalid(&self, to: ConnectionPhase) -> ProtocolError {
        ProtocolError::InvalidTransition {
            from: self.phase,
            to,
        }
    }

    /// Applies the handshake; the intent alone selects the next phase.
    pub fn on_handshake(
        &mut self,
        version: ProtocolVersion,
        intent: HandshakeIntent,
    ) -> Result<ConnectionPhase> {
        let to = intent.target_phase();
        if self.phase != ConnectionPhase::Handshake {
            return Err(self.invalid(to));
        }
        self.version = Some(version);
        self.transition(to);
        Ok(to)
    }

    /// Login Success went out. Older versions enter play right away, newer
    /// ones wait for the client's Login Acknowledged.
    pub fn on_login_success_sent(&mut self) -> Result<ConnectionPhase> {
        let Some(version) = self.version.filter(|_| self.phase == ConnectionPhase::Login) else {
            return Err(self.invalid(ConnectionPhase::Play));
        };
        if self.login_success_sent {
            return Err(self.invalid(ConnectionPhase::Configuration));
        }
        self.login_success_sent = true;
        if !version.has_configuration_phase() {
            self.transition(ConnectionPhase::Play);
        }
        Ok(self.phase)
    }

    pub fn on_login_acknowledged(&mut self) -> Result<ConnectionPhase> {
        let to = ConnectionPhase::Configuration;
        let has_configuration = self.version.is_some_and(|v| v.has_configuration_phase());
        if self.phase != ConnectionPhase::Login || !self.login_success_sent || !has_configuration {
            return Err(self.invalid(to));
        }
        self.transition(to);
        Ok(to)
    }

    pub fn on_configuration_finished(&mut self) -> Result<ConnectionPhase> {
        let to = ConnectionPhase::Play;
        if self.phase != ConnectionPhase::Configuration {
            return Err(self.invalid(to));
        }
        self.transition(to);
        Ok(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_login_goes_through_configuration() {
        let mut tracker = PhaseTracker::new();
        tracker
            .on_handshake(ProtocolVersion::V1_21, HandshakeIntent::Login)
            .unwrap();
        assert_eq!(tracker.on_login_success_sent().unwrap(), ConnectionPhase::Login);
        assert_eq!(
            tracker.on_login_acknowledged().unwrap(),
            ConnectionPhase::Configuration
        );
        assert_eq!(tracker.on_configuration_finished().unwrap(), ConnectionPhase::Play);
    }

    #[test]
    fn test_legacy_login_enters_play_directly() {
        let mut tracker = PhaseTracker::new();
        tracker
            .on_handshake(ProtocolVersion::V1_8, HandshakeIntent::Login)
            .unwrap();
        assert_eq!(tracker.on_login_success_sent().unwrap(), ConnectionPhase::Play);
        assert!(matches!(
            tracker.on_login_acknowledged(),
            Err(ProtocolError::InvalidTransition {
                from: ConnectionPhase::Play,
                to: ConnectionPhase::Configuration
            })
        ));
    }

    #[test]
    fn test_status_branch_never_reaches_login() {
        let mut tracker = PhaseTracker::new();
        assert_eq!(
            tracker
                .on_handshake(ProtocolVersion::V1_21, HandshakeIntent::Status)
                .unwrap(),
            ConnectionPhase::Status
        );
        assert!(tracker.on_login_success_sent().is_err());
        assert!(tracker.on_configuration_finished().is_err());
    }

    #[test]
    fn test_acknowledge_before_success_is_rejected() {
        let mut tracker = PhaseTracker::new();
        tracker
            .on_handshake(ProtocolVersion::V1_20_2, HandshakeIntent::Login)
            .unwrap();
        assert!(tracker.on_login_acknowledged().is_err());
    }

    #[test]
    fn test_transfer_intent_requires_1_20_5() {
        assert_eq!(
            HandshakeIntent::from_id(3, ProtocolVersion::V1_20_5).unwrap(),
            HandshakeIntent::Transfer
        );
        assert!(HandshakeIntent::from_id(3, ProtocolVersion::V1_20_3).is_err());
        assert!(HandshakeIntent::from_id(0, ProtocolVersion::V1_21).is_err());
    }
}
