//! Library surface for the `leakwatch` alerting tools.
//!
//! Two short-lived batch binaries are built on top of this crate:
//! - `leak-monitor` sweeps the sensor store for unacknowledged water-leak
//!   readings and requests SMS delivery for each of them.
//! - `send-sms` delivers exactly one SMS through the router's HTTP
//!   management API, under an allow-list and a rate cap.
//!
//! The modules follow the Explicit Module Boundary Pattern (EMBP): each
//! concern lives behind its own module gateway and the binaries only touch
//! the re-exports below.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod names;
pub mod schema;
pub mod store;

pub use config::{GatewayConfig, MonitorConfig};

// Re-exported here so the binaries and integration tests depend on the crate
// root only, which keeps refactoring of the module tree painless.
pub use gateway::{GatewayError, GatewaySender};
pub use models::{SendReport, SensorReading, Stage, StageFailure, SweepStats, TIME_FORMAT};
pub use monitor::SmsSender;
pub use names::NameCache;
