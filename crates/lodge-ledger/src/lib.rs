//! Occupancy, rent allocation, payment lifecycle and kitchen inventory rules for
//! shared-occupancy lodging.

pub mod clock;
pub mod config;
pub mod error;
pub mod kitchen;
pub mod lodging;
pub mod store;
pub mod telemetry;
