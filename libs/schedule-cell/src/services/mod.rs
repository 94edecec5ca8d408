pub mod calendar;
pub mod clock;
pub mod interaction;
pub mod schedule;
pub mod status;
pub mod ticker;
pub mod week;

pub use calendar::CalendarViewModel;
pub use clock::{Clock, ManualClock, SystemClock};
pub use interaction::route_interaction;
pub use schedule::{ScheduleService, ScheduleStore};
pub use status::{classify_slot, find_entry, resolve_cell, resolve_slot_status, slot_has_elapsed};
pub use ticker::StatusTicker;
pub use week::{shift_weeks, week_window, WeekWindow};
