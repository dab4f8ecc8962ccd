//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters and a fake clock.  All tests run on the host with
//! no radio, broker or GPIO required.

mod command_tests;
mod connectivity_tests;
mod mock_hw;
mod telemetry_tests;
