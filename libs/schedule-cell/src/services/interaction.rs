use crate::models::{SlotAction, SlotStatus, ViewerRole};

/// Maps a click on a cell to what the calendar should do with it.
///
/// Rules apply in order: elapsed cells are inert, the owner creates on empty
/// cells, patients book doctor-free cells, a patient's own booking and the
/// owner's open slots open their detail view. Everything else is read-only.
pub fn route_interaction(status: SlotStatus, role: ViewerRole) -> SlotAction {
    match (status, role) {
        (SlotStatus::Past, _) => SlotAction::NoOp,
        (SlotStatus::Empty, ViewerRole::Owner) => SlotAction::CreateSlot,
        (SlotStatus::DoctorFree, ViewerRole::Patient) => SlotAction::BookSlot,
        (SlotStatus::BookedByUser, _) => SlotAction::OpenDetail,
        (SlotStatus::DoctorFree, ViewerRole::Owner) => SlotAction::OpenDetail,
        _ => SlotAction::NoOp,
    }
}
