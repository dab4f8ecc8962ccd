//! Connectivity supervisor: keeps the link and the session alive.
//!
//! Called once per loop tick.  The link is checked on its own interval
//! (even while `Up`, to catch silent drops) and re-established with a
//! bounded, blocking burst of polls.  The session gets at most one connect
//! attempt per retry interval and is polled every tick while `Up`; each
//! delivery is handed to the [`SessionDelegate`] before the tick returns.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{
    EventSink, LastWill, LinkPort, SessionDelegate, SessionOptions, SessionPort,
};
use crate::config::{SystemConfig, TopicString, Topics};
use crate::error::LinkError;

use super::{ConnectionPhase, Layer, PhaseChange, PhaseMachine, SessionMachine};

/// A bounded association burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of status polls before giving up.
    pub attempts: u8,
    /// Wait between polls.
    pub delay_ms: u32,
}

/// Owned connect parameters; borrowed as [`SessionOptions`] per attempt.
#[derive(Debug, Clone)]
struct SessionProfile {
    client_id: String,
    username: Option<String>,
    password: Option<String>,
    keep_alive_secs: u16,
    timeout_secs: u16,
    will_topic: TopicString,
    will_payload: Vec<u8>,
}

impl SessionProfile {
    fn options(&self) -> SessionOptions<'_> {
        SessionOptions {
            client_id: &self.client_id,
            username: self.username.as_deref(),
            // A password without a user name is never sent.
            password: self.username.as_ref().and(self.password.as_deref()),
            keep_alive_secs: self.keep_alive_secs,
            timeout_secs: self.timeout_secs,
            will: Some(LastWill {
                topic: &self.will_topic,
                payload: &self.will_payload,
                retain: true,
            }),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

pub struct ConnectivitySupervisor {
    link: PhaseMachine,
    session: SessionMachine,

    link_check_interval_ms: u64,
    session_retry_interval_ms: u64,
    initial: RetryPolicy,
    reconnect: RetryPolicy,
    reset_delay_ms: u32,

    /// `None` until the first check; the first check is not delayed.
    last_link_check_ms: Option<u64>,
    /// `None` until the first attempt; the first attempt is not delayed.
    last_session_attempt_ms: Option<u64>,

    command_topic: TopicString,
    profile: SessionProfile,
}

impl ConnectivitySupervisor {
    pub fn new(config: &SystemConfig, topics: &Topics, client_id: &str, will_payload: Vec<u8>) -> Self {
        Self {
            link: PhaseMachine::new(Layer::Link),
            session: SessionMachine::new(),
            link_check_interval_ms: u64::from(config.link_check_interval_ms),
            session_retry_interval_ms: u64::from(config.session_retry_interval_ms),
            initial: RetryPolicy {
                attempts: config.link_initial_attempts,
                delay_ms: config.link_retry_delay_ms,
            },
            reconnect: RetryPolicy {
                attempts: config.link_reconnect_attempts,
                delay_ms: config.link_retry_delay_ms,
            },
            reset_delay_ms: config.link_reset_delay_ms,
            last_link_check_ms: None,
            last_session_attempt_ms: None,
            command_topic: topics.device_cmd.clone(),
            profile: SessionProfile {
                client_id: client_id.to_string(),
                username: non_empty(&config.mqtt_username),
                password: non_empty(&config.mqtt_password),
                keep_alive_secs: config.mqtt_keep_alive_secs,
                timeout_secs: config.mqtt_socket_timeout_secs,
                will_topic: topics.sys_online.clone(),
                will_payload,
            },
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn link_phase(&self) -> ConnectionPhase {
        self.link.phase()
    }

    pub fn session_phase(&self) -> ConnectionPhase {
        self.session.phase()
    }

    pub fn client_id(&self) -> &str {
        &self.profile.client_id
    }

    /// Connect parameters the next session attempt will use.
    pub fn session_options(&self) -> SessionOptions<'_> {
        self.profile.options()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// First link bring-up (long burst, no prior disconnect).
    pub fn bring_up(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkPort,
        delay: &mut impl DelayNs,
        sink: &mut dyn EventSink,
    ) -> Result<(), LinkError> {
        info!("Link: initial bring-up ({} polls)", self.initial.attempts);
        self.last_link_check_ms = Some(now_ms);
        let policy = self.initial;
        self.establish_link(link, delay, policy, false, sink)
    }

    /// One supervision step: link check, then session check / poll.
    pub fn tick<S, D>(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkPort,
        session: &mut S,
        delay: &mut impl DelayNs,
        delegate: &mut D,
        sink: &mut dyn EventSink,
    ) where
        S: SessionPort,
        D: SessionDelegate<S>,
    {
        if due(self.last_link_check_ms, now_ms, self.link_check_interval_ms) {
            self.last_link_check_ms = Some(now_ms);
            self.check_link(link, delay, sink);
        }

        if !self.link.is_up() {
            emit(self.session.drop_to_down(), sink);
            return;
        }

        if !self.session.is_up()
            && due(self.last_session_attempt_ms, now_ms, self.session_retry_interval_ms)
        {
            self.last_session_attempt_ms = Some(now_ms);
            self.attempt_session(session, delegate, sink);
        }

        if self.session.is_up() {
            self.service_session(session, delegate, sink);
        }
    }

    // ── Link ──────────────────────────────────────────────────

    fn check_link(&mut self, link: &mut impl LinkPort, delay: &mut impl DelayNs, sink: &mut dyn EventSink) {
        if link.is_connected() {
            if !self.link.is_up() {
                emit(self.link.transition(ConnectionPhase::Up), sink);
            }
            return;
        }
        if self.link.is_up() {
            warn!("Link: association lost");
        }
        emit(self.session.drop_to_down(), sink);
        let policy = self.reconnect;
        // Failure is already reported through the sink.
        let _ = self.establish_link(link, delay, policy, true, sink);
    }

    fn establish_link(
        &mut self,
        link: &mut impl LinkPort,
        delay: &mut impl DelayNs,
        policy: RetryPolicy,
        reset: bool,
        sink: &mut dyn EventSink,
    ) -> Result<(), LinkError> {
        emit(self.link.transition(ConnectionPhase::Connecting), sink);
        match self.run_burst(link, delay, policy, reset) {
            Ok(()) => {
                emit(self.link.transition(ConnectionPhase::Up), sink);
                Ok(())
            }
            Err(e) => {
                warn!("Link: {}", e);
                sink.emit(&AppEvent::LinkAttemptFailed(e));
                emit(self.link.transition(ConnectionPhase::Down), sink);
                Err(e)
            }
        }
    }

    fn run_burst(
        &self,
        link: &mut impl LinkPort,
        delay: &mut impl DelayNs,
        policy: RetryPolicy,
        reset: bool,
    ) -> Result<(), LinkError> {
        if reset {
            link.disconnect();
            delay.delay_ms(self.reset_delay_ms);
        }
        link.begin()?;
        for _ in 0..policy.attempts {
            if link.is_connected() {
                return Ok(());
            }
            delay.delay_ms(policy.delay_ms);
        }
        if link.is_connected() {
            Ok(())
        } else {
            Err(LinkError::Exhausted {
                attempts: policy.attempts,
            })
        }
    }

    // ── Session ───────────────────────────────────────────────

    fn attempt_session<S, D>(&mut self, session: &mut S, delegate: &mut D, sink: &mut dyn EventSink)
    where
        S: SessionPort,
        D: SessionDelegate<S>,
    {
        match self.session.begin_connecting(self.link.phase()) {
            Ok(change) => emit(change, sink),
            Err(e) => {
                debug!("Session: not attempting ({})", e);
                return;
            }
        }

        info!("Session: connecting as {}", self.profile.client_id);
        if let Err(e) = session.connect(&self.profile.options()) {
            warn!("Session: {}", e);
            sink.emit(&AppEvent::SessionAttemptFailed(e));
            emit(self.session.drop_to_down(), sink);
            return;
        }
        emit(self.session.establish(), sink);

        if let Err(e) = session.subscribe(&self.command_topic) {
            warn!("Session: subscribe {} failed: {}", self.command_topic, e);
        }
        delegate.on_session_established(session, sink);
    }

    fn service_session<S, D>(&mut self, session: &mut S, delegate: &mut D, sink: &mut dyn EventSink)
    where
        S: SessionPort,
        D: SessionDelegate<S>,
    {
        session.poll();
        if !session.is_connected() {
            warn!("Session: connection lost");
            emit(self.session.drop_to_down(), sink);
            while session.next_message().is_some() {}
            return;
        }
        while let Some(message) = session.next_message() {
            delegate.on_message(session, &message, sink);
        }
    }
}

/// Interval gate over a wrapping millisecond clock.
fn due(last_ms: Option<u64>, now_ms: u64, interval_ms: u64) -> bool {
    last_ms.is_none_or(|last| now_ms.wrapping_sub(last) >= interval_ms)
}

fn emit(change: Option<PhaseChange>, sink: &mut dyn EventSink) {
    if let Some(PhaseChange { layer, from, to }) = change {
        sink.emit(&AppEvent::PhaseChanged { layer, from, to });
    }
}
