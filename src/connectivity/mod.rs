//! Two-layer connection phase machines.
//!
//! ```text
//!   link:     Down ──▶ Connecting ──▶ Up ─┐
//!              ▲            │              │ drop
//!              └────────────┴──────────────┘
//!
//!   session:  Down ──▶ Connecting ──▶ Up      (Connecting requires link Up)
//! ```
//!
//! The machines only track phase; the [`ConnectivitySupervisor`] decides
//! when to move them and performs the I/O.

pub mod supervisor;

pub use supervisor::ConnectivitySupervisor;

use log::info;

use crate::error::SessionError;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionPhase {
    Down = 0,
    Connecting = 1,
    Up = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// WiFi station association.
    Link,
    /// MQTT session.
    Session,
}

impl Layer {
    pub fn name(self) -> &'static str {
        match self {
            Self::Link => "Link",
            Self::Session => "Session",
        }
    }
}

/// A phase transition that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub layer: Layer,
    pub from: ConnectionPhase,
    pub to: ConnectionPhase,
}

// ---------------------------------------------------------------------------
// Generic phase machine
// ---------------------------------------------------------------------------

/// Phase tracker for one layer.  Self-transitions are not reported.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    layer: Layer,
    phase: ConnectionPhase,
}

impl PhaseMachine {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            phase: ConnectionPhase::Down,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn is_up(&self) -> bool {
        self.phase == ConnectionPhase::Up
    }

    /// Move to `to`.  Returns the change, or `None` if already there.
    pub fn transition(&mut self, to: ConnectionPhase) -> Option<PhaseChange> {
        if self.phase == to {
            return None;
        }
        let change = PhaseChange {
            layer: self.layer,
            from: self.phase,
            to,
        };
        info!("{}: {:?} -> {:?}", self.layer.name(), self.phase, to);
        self.phase = to;
        Some(change)
    }
}

// ---------------------------------------------------------------------------
// Session machine (guarded by the link phase)
// ---------------------------------------------------------------------------

/// Session phase tracker that cannot start connecting over a dead link.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    inner: PhaseMachine,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            inner: PhaseMachine::new(Layer::Session),
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.inner.phase()
    }

    pub fn is_up(&self) -> bool {
        self.inner.is_up()
    }

    /// Enter `Connecting`.  Refused unless `link` is `Up`.
    pub fn begin_connecting(
        &mut self,
        link: ConnectionPhase,
    ) -> Result<Option<PhaseChange>, SessionError> {
        if link != ConnectionPhase::Up {
            return Err(SessionError::LinkDown);
        }
        Ok(self.inner.transition(ConnectionPhase::Connecting))
    }

    /// `Connecting → Up`.  Ignored from any other phase.
    pub fn establish(&mut self) -> Option<PhaseChange> {
        if self.inner.phase() != ConnectionPhase::Connecting {
            return None;
        }
        self.inner.transition(ConnectionPhase::Up)
    }

    pub fn drop_to_down(&mut self) -> Option<PhaseChange> {
        self.inner.transition(ConnectionPhase::Down)
    }
}
