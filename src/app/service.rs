//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the canonical [`DeviceState`], the connectivity
//! supervisor, the command processor and the telemetry scheduler.  All I/O
//! flows through port traits injected at call sites, so the whole service
//! runs against mock adapters and a fake clock.
//!
//! ```text
//!    LinkPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//! SessionPort ◀─▶ │          AppService           │
//!  SensorPort ──▶ │ Supervisor · Processor · Sched │
//! ActuatorPort ◀──└──────────────────────────────┘
//! ```
//!
//! Tick order: link check, session check / poll (commands applied here),
//! sensor telemetry, heartbeat.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::config::{SystemConfig, Topics};
use crate::connectivity::{ConnectionPhase, ConnectivitySupervisor};
use crate::error::ConfigError;
use crate::scheduler::{Schedule, TelemetryScheduler};

use super::events::AppEvent;
use super::ports::{
    ActuatorPort, EventSink, InboundMessage, LinkPort, ReportKind, SchedulerDelegate,
    SensorPort, SessionDelegate, SessionPort,
};
use super::processor::{CommandOutcome, CommandProcessor};
use super::reporter::Reporter;
use super::state::DeviceState;
use super::telemetry::TelemetrySample;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    state: DeviceState,
    supervisor: ConnectivitySupervisor,
    processor: CommandProcessor,
    reporter: Reporter,
    scheduler: TelemetryScheduler,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// `client_id` is the session client identifier (see
    /// [`adapters::device_id::client_id`](crate::adapters::device_id::client_id)).
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, client_id: &str) -> Result<Self, ConfigError> {
        config.validate()?;
        let topics = Topics::new(&config.topic_namespace)?;
        let reporter = Reporter::new(topics.clone(), &config.device_id, &config.firmware_version);
        let supervisor =
            ConnectivitySupervisor::new(&config, &topics, client_id, reporter.last_will_payload());

        let mut scheduler = TelemetryScheduler::new();
        scheduler.add(Schedule {
            label: "sensor telemetry",
            kind: ReportKind::SensorTelemetry,
            interval_ms: u64::from(config.sensor_publish_interval_ms),
        });
        scheduler.add(Schedule {
            label: "heartbeat",
            kind: ReportKind::Heartbeat,
            interval_ms: u64::from(config.heartbeat_interval_ms),
        });

        Ok(Self {
            state: DeviceState::default(),
            supervisor,
            processor: CommandProcessor::new(),
            reporter,
            scheduler,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive actuators to the power-on state, bring the link up and arm
    /// the schedules.  The link may still be down afterwards; the next
    /// ticks keep retrying.
    pub fn start(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkPort,
        delay: &mut impl DelayNs,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        hw.set_light(self.state.light_on);
        hw.set_pump_drive(false);
        hw.set_pump_duty(0);

        // Failure is reported through the sink and retried on tick.
        let _ = self.supervisor.bring_up(now_ms, link, delay, sink);
        self.scheduler.start(now_ms);

        sink.emit(&AppEvent::Started(self.state));
        info!("AppService started ({:?})", self.state);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration at `now_ms`.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick<S: SessionPort>(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkPort,
        session: &mut S,
        hw: &mut (impl SensorPort + ActuatorPort),
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1–2. Link check, session check / poll, command dispatch
        let mut handler = SessionHandler {
            state: &mut self.state,
            processor: &self.processor,
            reporter: &self.reporter,
            hw: &mut *hw,
            now_ms,
        };
        self.supervisor
            .tick(now_ms, link, session, delay, &mut handler, sink);

        // 3–4. Sensor telemetry, heartbeat
        let mut reports = ReportHandler {
            session,
            hw,
            state: &self.state,
            reporter: &self.reporter,
            session_up: self.supervisor.session_phase() == ConnectionPhase::Up,
            now_ms,
            sink,
        };
        self.scheduler.tick(now_ms, &mut reports);
    }

    /// Apply a command payload directly, bypassing the session's inbound
    /// queue.  The resulting state is still published on `session`.
    pub fn handle_command(
        &mut self,
        raw: &[u8],
        now_ms: u64,
        session: &mut impl SessionPort,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        self.processor
            .apply(raw, &mut self.state, hw, session, &self.reporter, now_ms, sink)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current canonical device state.
    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn link_phase(&self) -> ConnectionPhase {
        self.supervisor.link_phase()
    }

    pub fn session_phase(&self) -> ConnectionPhase {
        self.supervisor.session_phase()
    }

    pub fn client_id(&self) -> &str {
        self.supervisor.client_id()
    }

    pub fn topics(&self) -> &Topics {
        self.reporter.topics()
    }

    /// Total loop ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

// ───────────────────────────────────────────────────────────────
// Delegates
// ───────────────────────────────────────────────────────────────

/// Session callbacks: announce on connect, dispatch commands.
struct SessionHandler<'a, H> {
    state: &'a mut DeviceState,
    processor: &'a CommandProcessor,
    reporter: &'a Reporter,
    hw: &'a mut H,
    now_ms: u64,
}

impl<S, H> SessionDelegate<S> for SessionHandler<'_, H>
where
    S: SessionPort,
    H: SensorPort + ActuatorPort,
{
    fn on_session_established(&mut self, session: &mut S, sink: &mut dyn EventSink) {
        let rssi = self.hw.read_signal_strength();
        self.reporter
            .publish_announcement(session, rssi, self.now_ms, sink);
        self.reporter
            .publish_state(session, self.state, rssi, self.now_ms, sink);
    }

    fn on_message(&mut self, session: &mut S, message: &InboundMessage, sink: &mut dyn EventSink) {
        if message.topic != self.reporter.topics().device_cmd.as_str() {
            debug!("Session: ignoring delivery on {}", message.topic);
            return;
        }
        self.processor.apply(
            &message.payload,
            self.state,
            self.hw,
            session,
            self.reporter,
            self.now_ms,
            sink,
        );
    }
}

/// Scheduler callback: publishes due reports while the session is up.
struct ReportHandler<'a, S, H> {
    session: &'a mut S,
    hw: &'a mut H,
    state: &'a DeviceState,
    reporter: &'a Reporter,
    session_up: bool,
    now_ms: u64,
    sink: &'a mut dyn EventSink,
}

impl<S, H> SchedulerDelegate for ReportHandler<'_, S, H>
where
    S: SessionPort,
    H: SensorPort,
{
    fn on_schedule_fired(&mut self, label: &str, kind: ReportKind) {
        if !self.session_up {
            debug!("Scheduler: '{}' skipped, session down", label);
            return;
        }
        match kind {
            ReportKind::SensorTelemetry => {
                let sample = TelemetrySample::capture(self.hw, self.now_ms);
                if self.reporter.publish_telemetry(self.session, &sample, self.sink) {
                    self.sink.emit(&AppEvent::Telemetry(sample));
                }
            }
            ReportKind::Heartbeat => {
                let rssi = self.hw.read_signal_strength();
                self.reporter
                    .publish_state(self.session, self.state, rssi, self.now_ms, self.sink);
                self.reporter
                    .publish_announcement(self.session, rssi, self.now_ms, self.sink);
                self.sink.emit(&AppEvent::Heartbeat(*self.state));
            }
        }
    }
}
