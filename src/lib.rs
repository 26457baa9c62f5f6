//! Attendance session and geofencing engine.
//!
//! [`session::SessionWindow`] decides whether check-ins are currently
//! accepted; [`ledger::AttendanceLedger`] owns per-student attendance state
//! and applies the campus geofence on every check-in. Both sit on an
//! [`store::AttendanceStore`] and report mutations through
//! [`events::ChangeFeed`]. The `attendd` binary exposes them over a
//! line-delimited JSON protocol on stdin/stdout (see [`ipc`]).

pub mod clock;
pub mod config;
pub mod db;
pub mod events;
pub mod geo;
pub mod ipc;
pub mod ledger;
pub mod model;
pub mod roster;
pub mod service;
pub mod session;
pub mod store;

pub use service::Attendance;
