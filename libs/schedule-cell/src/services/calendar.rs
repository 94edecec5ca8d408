use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, instrument, warn};

use shared_models::auth::Session;

use crate::error::ScheduleError;
use crate::models::{
    standard_time_slots, BookingDetails, CalendarCell, CalendarEvent, CalendarGrid,
    CreateScheduleRequest, ScheduleEntry, SlotAction, SlotDetails, TimeSlot,
    UpdateScheduleRequest, ViewerRole,
};
use crate::services::clock::Clock;
use crate::services::interaction::route_interaction;
use crate::services::schedule::ScheduleStore;
use crate::services::status::{find_entry, resolve_cell, slot_has_elapsed};
use crate::services::week::{shift_weeks, WeekWindow};

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct CalendarState {
    reference: NaiveDate,
    entries: Vec<ScheduleEntry>,
    now: NaiveDateTime,
}

/// One doctor's weekly calendar, as seen by one session.
///
/// The same view-model backs the doctor, patient and admin calendars; the
/// viewer's [`ViewerRole`] decides what clicks do. Entries are a read-through
/// cache: mutations go to the store first and the cache is only replaced by a
/// wholesale refetch once the store confirms.
pub struct CalendarViewModel {
    store: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    session: Session,
    doctor_id: String,
    role: ViewerRole,
    slots: Vec<TimeSlot>,
    state: RwLock<CalendarState>,
    in_flight: AtomicBool,
    events: broadcast::Sender<CalendarEvent>,
}

/// Clears the in-flight flag when the request finishes, whatever the outcome.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CalendarViewModel {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        clock: Arc<dyn Clock>,
        session: Session,
        doctor_id: impl Into<String>,
    ) -> Self {
        let doctor_id = doctor_id.into();
        let role = ViewerRole::for_calendar(&session, &doctor_id);
        let now = clock.now();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            store,
            clock,
            session,
            doctor_id,
            role,
            slots: standard_time_slots().to_vec(),
            state: RwLock::new(CalendarState {
                reference: now.date(),
                entries: Vec::new(),
                now,
            }),
            in_flight: AtomicBool::new(false),
            events,
        }
    }

    /// Replaces the standard hourly grid.
    pub fn with_time_slots(mut self, slots: Vec<TimeSlot>) -> Self {
        self.slots = slots;
        self
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    pub fn viewer_role(&self) -> ViewerRole {
        self.role
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// True while a mutation is outstanding; the triggering control should
    /// be disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CalendarEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CalendarEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ==========================================================================
    // WEEK NAVIGATION
    // ==========================================================================

    pub async fn week(&self) -> WeekWindow {
        WeekWindow::containing(self.state.read().await.reference)
    }

    pub async fn navigate(&self, weeks: i64) -> Result<WeekWindow, ScheduleError> {
        let window = {
            let mut state = self.state.write().await;
            let reference = shift_weeks(state.reference, weeks).ok_or_else(|| {
                ScheduleError::Validation("Requested week is out of range".to_string())
            })?;
            state.reference = reference;
            WeekWindow::containing(reference)
        };

        debug!("Calendar for {} moved to week of {}", self.doctor_id, window.start());
        self.emit(CalendarEvent::WeekChanged {
            start: window.start(),
        });
        Ok(window)
    }

    pub async fn go_to_date(&self, date: NaiveDate) -> WeekWindow {
        let window = {
            let mut state = self.state.write().await;
            state.reference = date;
            WeekWindow::containing(date)
        };

        self.emit(CalendarEvent::WeekChanged {
            start: window.start(),
        });
        window
    }

    pub async fn go_to_today(&self) -> WeekWindow {
        let today = self.clock.now().date();
        self.go_to_date(today).await
    }

    // ==========================================================================
    // DATA AND TIME
    // ==========================================================================

    /// Replaces the cached entries with a fresh copy from the store.
    #[instrument(skip(self), fields(doctor_id = %self.doctor_id))]
    pub async fn refresh(&self) -> Result<usize, ScheduleError> {
        let entries = match self.role {
            ViewerRole::Owner => self.store.fetch_own_entries(&self.session).await?,
            ViewerRole::Patient | ViewerRole::Observer => {
                self.store
                    .fetch_doctor_entries(&self.doctor_id, &self.session)
                    .await?
            }
        };

        let count = entries.len();
        {
            let mut state = self.state.write().await;
            state.entries = entries;
            state.now = self.clock.now();
        }

        debug!("Calendar refreshed with {} entries", count);
        self.emit(CalendarEvent::Refreshed { entries: count });
        Ok(count)
    }

    /// Re-reads the clock. Returns how many cells of the visible week went
    /// from actionable to past since the previous evaluation.
    pub async fn tick(&self) -> usize {
        let now = self.clock.now();
        let elapsed = {
            let mut state = self.state.write().await;
            let previous = state.now;
            state.now = now;

            let window = WeekWindow::containing(state.reference);
            window
                .days()
                .iter()
                .flat_map(|day| self.slots.iter().map(move |slot| (*day, slot)))
                .filter(|(day, slot)| {
                    slot_has_elapsed(*day, slot, now) && !slot_has_elapsed(*day, slot, previous)
                })
                .count()
        };

        if elapsed > 0 {
            debug!("{} calendar slots elapsed", elapsed);
            self.emit(CalendarEvent::SlotsElapsed { count: elapsed });
        }
        elapsed
    }

    pub async fn entries(&self) -> Vec<ScheduleEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn entry(&self, entry_id: &str) -> Option<ScheduleEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
    }

    // ==========================================================================
    // RENDERING
    // ==========================================================================

    fn doctor_entries<'a>(
        &'a self,
        entries: &'a [ScheduleEntry],
    ) -> impl Iterator<Item = &'a ScheduleEntry> + 'a {
        entries.iter().filter(move |e| e.doctor_id == self.doctor_id)
    }

    fn build_cell(&self, state: &CalendarState, day: NaiveDate, slot: &TimeSlot) -> CalendarCell {
        resolve_cell(
            self.doctor_entries(&state.entries),
            day,
            slot,
            self.session.user_id(),
            state.now,
        )
    }

    pub async fn grid(&self) -> CalendarGrid {
        let state = self.state.read().await;
        let window = WeekWindow::containing(state.reference);

        let rows: Vec<Vec<CalendarCell>> = self
            .slots
            .iter()
            .map(|slot| {
                window
                    .days()
                    .iter()
                    .map(|day| self.build_cell(&state, *day, slot))
                    .collect::<Vec<_>>()
            })
            .collect();

        CalendarGrid {
            doctor_id: self.doctor_id.clone(),
            viewer_role: self.role,
            days: *window.days(),
            slots: self.slots.clone(),
            rows,
            evaluated_at: state.now,
        }
    }

    fn slot_at(&self, slot_index: usize) -> Result<TimeSlot, ScheduleError> {
        self.slots
            .get(slot_index)
            .copied()
            .ok_or_else(|| ScheduleError::Validation(format!("Unknown time slot {}", slot_index)))
    }

    pub async fn cell(&self, day: NaiveDate, slot_index: usize) -> Result<CalendarCell, ScheduleError> {
        let slot = self.slot_at(slot_index)?;
        let state = self.state.read().await;
        Ok(self.build_cell(&state, day, &slot))
    }

    /// What clicking the cell should do for this viewer.
    pub async fn click(&self, day: NaiveDate, slot_index: usize) -> Result<SlotAction, ScheduleError> {
        let cell = self.cell(day, slot_index).await?;
        let action = route_interaction(cell.status, self.role);
        debug!(
            "Click on {} {} ({}) as {:?} -> {:?}",
            day, cell.slot, cell.status, self.role, action
        );
        Ok(action)
    }

    // ==========================================================================
    // MUTATIONS
    // ==========================================================================

    fn begin_request(&self) -> Result<InFlightGuard<'_>, ScheduleError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Ignoring calendar action while a request is in flight");
            return Err(ScheduleError::RequestInFlight);
        }
        Ok(InFlightGuard(&self.in_flight))
    }

    fn require_owner(&self) -> Result<(), ScheduleError> {
        if self.role != ViewerRole::Owner {
            return Err(ScheduleError::Validation(
                "Only the schedule owner can manage slots".to_string(),
            ));
        }
        Ok(())
    }

    /// Refetches after a confirmed mutation. If the refetch fails the
    /// confirmed entry is applied locally so the view stays consistent.
    async fn reload_after(&self, confirmed: Option<&ScheduleEntry>, removed: Option<&str>) {
        if let Err(e) = self.refresh().await {
            error!("Refetch after schedule change failed: {}", e);

            let mut state = self.state.write().await;
            if let Some(id) = removed {
                state.entries.retain(|entry| entry.id != id);
            }
            if let Some(entry) = confirmed {
                match state.entries.iter_mut().find(|e| e.id == entry.id) {
                    Some(existing) => *existing = entry.clone(),
                    None => state.entries.push(entry.clone()),
                }
            }
        }
    }

    async fn cached_entry(&self, entry_id: &str) -> Result<ScheduleEntry, ScheduleError> {
        self.entry(entry_id)
            .await
            .ok_or_else(|| ScheduleError::NotFound(entry_id.to_string()))
    }

    /// Opens an empty cell as a bookable slot.
    ///
    /// Cells held by a cached entry are refused locally. The owner's cache
    /// only holds their own schedule, so a clash with another doctor comes
    /// back from the store as a conflict and leaves the cache untouched.
    #[instrument(skip(self, details), fields(doctor_id = %self.doctor_id))]
    pub async fn create_slot(
        &self,
        day: NaiveDate,
        slot_index: usize,
        details: SlotDetails,
    ) -> Result<ScheduleEntry, ScheduleError> {
        self.require_owner()?;
        let slot = self.slot_at(slot_index)?;
        let _guard = self.begin_request()?;

        let request = {
            let state = self.state.read().await;
            if slot_has_elapsed(day, &slot, state.now) {
                return Err(ScheduleError::SlotElapsed);
            }
            if let Some(existing) = find_entry(&state.entries, day, &slot) {
                warn!(
                    "Slot {} {} already held by entry {} of doctor {}",
                    day, slot, existing.id, existing.doctor_id
                );
                return Err(ScheduleError::Conflict(format!(
                    "The {} slot on {} is already taken",
                    slot, day
                )));
            }

            let request = CreateScheduleRequest::new(&self.doctor_id, day, slot, details);
            request.validate()?;
            request
        };

        let created = self.store.create_entry(&request, &self.session).await?;
        info!("Slot {} {} opened as {}", day, slot, created.id);

        self.reload_after(Some(&created), None).await;
        Ok(created)
    }

    /// Books a doctor-free cell for the session's patient.
    #[instrument(skip(self, details), fields(doctor_id = %self.doctor_id))]
    pub async fn book_slot(
        &self,
        day: NaiveDate,
        slot_index: usize,
        details: BookingDetails,
    ) -> Result<ScheduleEntry, ScheduleError> {
        if self.role != ViewerRole::Patient {
            return Err(ScheduleError::Validation(
                "Only patients can book appointments".to_string(),
            ));
        }
        let slot = self.slot_at(slot_index)?;
        let _guard = self.begin_request()?;

        let entry_id = {
            let state = self.state.read().await;
            if slot_has_elapsed(day, &slot, state.now) {
                return Err(ScheduleError::SlotElapsed);
            }
            let entry = find_entry(self.doctor_entries(&state.entries), day, &slot)
                .ok_or_else(|| {
                    ScheduleError::Validation(format!(
                        "The doctor has not opened the {} slot on {}",
                        slot, day
                    ))
                })?;

            if entry.unreadable {
                return Err(ScheduleError::Conflict(format!(
                    "The {} slot on {} is not available",
                    slot, day
                )));
            }
            match entry.patient_id() {
                Some(patient) if patient == self.session.user_id() => {
                    return Err(ScheduleError::Validation(
                        "You have already booked this slot".to_string(),
                    ));
                }
                Some(_) => {
                    return Err(ScheduleError::Conflict(format!(
                        "The {} slot on {} has already been booked",
                        slot, day
                    )));
                }
                None => entry.id.clone(),
            }
        };

        let request = UpdateScheduleRequest::booking(self.session.user_id(), details);
        let booked = self
            .store
            .update_entry(&entry_id, &request, &self.session)
            .await?;
        info!("Booked slot {} {} ({})", day, slot, booked.id);

        self.reload_after(Some(&booked), None).await;
        Ok(booked)
    }

    /// Edits one of the owner's entries. Moving it onto an occupied cell is a
    /// conflict.
    #[instrument(skip(self, request), fields(doctor_id = %self.doctor_id))]
    pub async fn update_slot(
        &self,
        entry_id: &str,
        request: UpdateScheduleRequest,
    ) -> Result<ScheduleEntry, ScheduleError> {
        self.require_owner()?;
        let _guard = self.begin_request()?;

        {
            let state = self.state.read().await;
            let current = state
                .entries
                .iter()
                .find(|e| e.id == entry_id)
                .ok_or_else(|| ScheduleError::NotFound(entry_id.to_string()))?;

            if current.unreadable {
                return Err(ScheduleError::Validation(
                    "This slot could not be read; refresh the calendar".to_string(),
                ));
            }
            if slot_has_elapsed(current.date, &current.time_slot, state.now) {
                return Err(ScheduleError::SlotElapsed);
            }
            request.validate_against(current)?;

            if request.moves_slot() {
                let day = request.date.unwrap_or(current.date);
                let slot = request.time_slot.unwrap_or(current.time_slot);
                if slot_has_elapsed(day, &slot, state.now) {
                    return Err(ScheduleError::SlotElapsed);
                }
                let clash = state
                    .entries
                    .iter()
                    .find(|e| e.id != entry_id && e.occupies(day, &slot));
                if clash.is_some() {
                    return Err(ScheduleError::Conflict(format!(
                        "The {} slot on {} is already taken",
                        slot, day
                    )));
                }
            }
        }

        let updated = self
            .store
            .update_entry(entry_id, &request, &self.session)
            .await?;

        self.reload_after(Some(&updated), None).await;
        Ok(updated)
    }

    /// Removes an unbooked entry.
    #[instrument(skip(self), fields(doctor_id = %self.doctor_id))]
    pub async fn delete_slot(&self, entry_id: &str) -> Result<(), ScheduleError> {
        self.require_owner()?;
        let _guard = self.begin_request()?;

        let entry = self.cached_entry(entry_id).await?;
        if !entry.is_deletable() {
            return Err(ScheduleError::Validation(
                "Only slots without a booking can be deleted".to_string(),
            ));
        }
        if slot_has_elapsed(entry.date, &entry.time_slot, self.state.read().await.now) {
            return Err(ScheduleError::SlotElapsed);
        }

        self.store.delete_entry(entry_id, &self.session).await?;

        self.reload_after(None, Some(entry_id)).await;
        Ok(())
    }

    /// Turns down a patient's booking request, freeing the slot again.
    #[instrument(skip(self), fields(doctor_id = %self.doctor_id))]
    pub async fn reject_booking(&self, entry_id: &str) -> Result<ScheduleEntry, ScheduleError> {
        self.require_owner()?;
        let _guard = self.begin_request()?;

        let entry = self.cached_entry(entry_id).await?;
        if !entry.is_booked() {
            return Err(ScheduleError::Validation(
                "There is no booking to reject on this slot".to_string(),
            ));
        }
        if slot_has_elapsed(entry.date, &entry.time_slot, self.state.read().await.now) {
            return Err(ScheduleError::SlotElapsed);
        }

        let freed = self.store.reject_booking(entry_id, &self.session).await?;
        info!("Rejected booking on {}", freed.id);

        self.reload_after(Some(&freed), None).await;
        Ok(freed)
    }
}
