//! Application core: pure domain logic, zero I/O.
//!
//! Device state, command decoding and planning, report documents and the
//! orchestrating [`service::AppService`].  All interaction with hardware and
//! the network happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod processor;
pub mod reporter;
pub mod service;
pub mod state;
pub mod telemetry;
