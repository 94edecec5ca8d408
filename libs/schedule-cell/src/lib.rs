//! # Schedule Cell
//!
//! Slot calendar view-model for doctor schedules.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                  Schedule Cell                      |
//! +-----------------------------------------------------+
//! |  models.rs        |  Entries, slots, statuses       |
//! |  error.rs         |  ScheduleError                  |
//! |  services/        |                                 |
//! |    week.rs        |  Monday-based week window       |
//! |    status.rs      |  Slot status resolution         |
//! |    interaction.rs |  Click -> action routing        |
//! |    schedule.rs    |  REST schedule store            |
//! |    calendar.rs    |  CalendarViewModel              |
//! |    ticker.rs      |  Periodic "now" re-evaluation   |
//! |    clock.rs       |  Injectable clock               |
//! +-----------------------------------------------------+
//! ```
//!
//! Status resolution is a pure function of the cached entries, the viewer and
//! an injected current time, so every rendering of the calendar (doctor,
//! patient, admin) goes through the same code path.

pub mod error;
pub mod models;
pub mod services;

pub use error::ScheduleError;
pub use models::*;
pub use services::*;
