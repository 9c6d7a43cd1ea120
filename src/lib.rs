//! Appointment scheduling core for a student/advisor booking system.
//!
//! The crate owns advisor availability windows, appointment records and
//! their status lifecycle, and orchestrates booking requests so that two
//! students can never hold the same slot. Authentication, routing and
//! rendering live outside; callers hand in explicit identities and get
//! explicit results back.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod interval;
pub mod scheduler;
pub mod telemetry;

pub use config::{BookingPolicy, Config};
pub use error::{SchedulingError, SchedulingResult};
pub use interval::TimeInterval;
pub use scheduler::Scheduler;
