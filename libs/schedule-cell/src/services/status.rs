use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{CalendarCell, ScheduleEntry, SlotStatus, TimeSlot};

/// First entry occupying `(day, slot)`. Duplicates resolve to iteration order.
pub fn find_entry<'a, I>(entries: I, day: NaiveDate, slot: &TimeSlot) -> Option<&'a ScheduleEntry>
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    entries.into_iter().find(|entry| entry.occupies(day, slot))
}

/// Occupancy of a cell, ignoring the clock. Unreadable entries count as
/// someone else's booking.
pub fn classify_slot(entry: Option<&ScheduleEntry>, viewer_id: &str) -> SlotStatus {
    match entry {
        None => SlotStatus::Empty,
        Some(entry) if entry.unreadable => SlotStatus::BookedByOther,
        Some(entry) => match entry.patient_id() {
            None => SlotStatus::DoctorFree,
            Some(patient) if patient == viewer_id => SlotStatus::BookedByUser,
            Some(_) => SlotStatus::BookedByOther,
        },
    }
}

/// A slot is over once its end instant is at or before `now`.
pub fn slot_has_elapsed(day: NaiveDate, slot: &TimeSlot, now: NaiveDateTime) -> bool {
    slot.ends_on(day) <= now
}

pub fn resolve_slot_status<'a, I>(
    entries: I,
    day: NaiveDate,
    slot: &TimeSlot,
    viewer_id: &str,
    now: NaiveDateTime,
) -> SlotStatus
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    resolve_cell(entries, day, slot, viewer_id, now).status
}

pub fn resolve_cell<'a, I>(
    entries: I,
    day: NaiveDate,
    slot: &TimeSlot,
    viewer_id: &str,
    now: NaiveDateTime,
) -> CalendarCell
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    let entry = find_entry(entries, day, slot);
    let occupancy = classify_slot(entry, viewer_id);
    let status = if slot_has_elapsed(day, slot, now) {
        SlotStatus::Past
    } else {
        occupancy
    };

    CalendarCell {
        day,
        slot: *slot,
        status,
        occupancy,
        entry_id: entry.map(|e| e.id.clone()),
    }
}
