// libs/schedule-cell/src/models.rs
use std::fmt;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared_models::auth::{Role, Session};

use crate::error::ScheduleError;

// ==============================================================================
// TIME SLOTS
// ==============================================================================

/// A fixed wall-clock interval within a day. Matching against schedule entries
/// is exact on both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl TimeSlot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Result<Self, ScheduleError> {
        if end_time <= start_time {
            return Err(ScheduleError::Validation(
                "Time slot must end after it starts".to_string(),
            ));
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }

    /// Display string in the calendar header style, e.g. `09AM - 10AM`.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%I%p"),
            self.end_time.format("%I%p")
        )
    }

    pub fn starts_on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.start_time)
    }

    pub fn ends_on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.end_time)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// The process-wide slot grid: hourly from 09AM to 05PM.
pub fn standard_time_slots() -> &'static [TimeSlot] {
    static SLOTS: OnceLock<Vec<TimeSlot>> = OnceLock::new();
    SLOTS.get_or_init(|| {
        (9..17)
            .filter_map(|hour| {
                let start = NaiveTime::from_hms_opt(hour, 0, 0)?;
                let end = NaiveTime::from_hms_opt(hour + 1, 0, 0)?;
                Some(TimeSlot {
                    start_time: start,
                    end_time: end,
                })
            })
            .collect()
    })
}

// ==============================================================================
// SCHEDULE ENTRIES
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Created,
    Booked,
    Completed,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Created => write!(f, "created"),
            EntryStatus::Booked => write!(f, "booked"),
            EntryStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentType {
    Online,
    #[default]
    Offline,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Online => write!(f, "online"),
            AppointmentType::Offline => write!(f, "offline"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "doctor", deserialize_with = "id_ref::required")]
    pub doctor_id: String,
    #[serde(with = "day_date")]
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    #[serde(
        default,
        deserialize_with = "id_ref::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub patient: Option<String>,
    pub status: EntryStatus,
    #[serde(default)]
    pub appointment_type: AppointmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    /// Set when only the slot position could be decoded. The cell reads as
    /// taken and offers no actions.
    #[serde(skip)]
    pub unreadable: bool,
}

/// The minimum needed to know which cell a record holds.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotClaim {
    #[serde(alias = "_id")]
    id: String,
    #[serde(default, alias = "doctor", deserialize_with = "id_ref::optional")]
    doctor_id: Option<String>,
    #[serde(with = "day_date")]
    date: NaiveDate,
    time_slot: TimeSlot,
}

impl ScheduleEntry {
    /// Decodes a backend record. A record whose position is readable but
    /// whose other fields are not comes back flagged [`Self::unreadable`],
    /// attributed to `fallback_doctor_id` when it names no doctor.
    pub fn decode(raw: &Value, fallback_doctor_id: &str) -> Result<Self, serde_json::Error> {
        let err = match ScheduleEntry::deserialize(raw) {
            Ok(entry) => return Ok(entry),
            Err(e) => e,
        };
        let claim = SlotClaim::deserialize(raw).map_err(|_| err)?;

        Ok(Self {
            id: claim.id,
            doctor_id: claim
                .doctor_id
                .unwrap_or_else(|| fallback_doctor_id.to_string()),
            date: claim.date,
            time_slot: claim.time_slot,
            patient: None,
            status: EntryStatus::Booked,
            appointment_type: AppointmentType::default(),
            notes: None,
            meeting_link: None,
            unreadable: true,
        })
    }

    pub fn occupies(&self, day: NaiveDate, slot: &TimeSlot) -> bool {
        self.date == day && self.time_slot == *slot
    }

    /// Blank patient ids are treated as unbooked.
    pub fn patient_id(&self) -> Option<&str> {
        self.patient.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn is_booked(&self) -> bool {
        self.patient_id().is_some()
    }

    pub fn is_deletable(&self) -> bool {
        !self.unreadable && self.status == EntryStatus::Created && !self.is_booked()
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// What a doctor fills in when opening an empty cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDetails {
    pub appointment_type: AppointmentType,
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
}

impl SlotDetails {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn online(meeting_link: impl Into<String>) -> Self {
        Self {
            appointment_type: AppointmentType::Online,
            notes: None,
            meeting_link: Some(meeting_link.into()),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// What a patient supplies when booking a doctor-free slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    #[serde(rename = "doctor")]
    pub doctor_id: String,
    #[serde(with = "day_date")]
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub appointment_type: AppointmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
}

impl CreateScheduleRequest {
    pub fn new(doctor_id: &str, date: NaiveDate, time_slot: TimeSlot, details: SlotDetails) -> Self {
        Self {
            doctor_id: doctor_id.to_string(),
            date,
            time_slot,
            appointment_type: details.appointment_type,
            notes: details.notes,
            meeting_link: details.meeting_link,
        }
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.doctor_id.trim().is_empty() {
            return Err(ScheduleError::Validation("Doctor is required".to_string()));
        }
        if self.time_slot.end_time <= self.time_slot.start_time {
            return Err(ScheduleError::Validation(
                "Time slot must end after it starts".to_string(),
            ));
        }
        validate_meeting_link(self.appointment_type, self.meeting_link.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    #[serde(
        default,
        with = "day_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<TimeSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<AppointmentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
}

impl UpdateScheduleRequest {
    /// Attaches `patient_id` to an open slot.
    pub fn booking(patient_id: &str, details: BookingDetails) -> Self {
        Self {
            patient: Some(patient_id.to_string()),
            status: Some(EntryStatus::Booked),
            notes: details.notes,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn moves_slot(&self) -> bool {
        self.date.is_some() || self.time_slot.is_some()
    }

    /// Validates the request against the entry it will be applied to.
    pub fn validate_against(&self, current: &ScheduleEntry) -> Result<(), ScheduleError> {
        if self.is_empty() {
            return Err(ScheduleError::Validation("Nothing to update".to_string()));
        }
        if let Some(slot) = &self.time_slot {
            if slot.end_time <= slot.start_time {
                return Err(ScheduleError::Validation(
                    "Time slot must end after it starts".to_string(),
                ));
            }
        }

        let appointment_type = self.appointment_type.unwrap_or(current.appointment_type);
        let meeting_link = self
            .meeting_link
            .as_deref()
            .or(current.meeting_link.as_deref());
        validate_meeting_link(appointment_type, meeting_link)
    }
}

fn validate_meeting_link(
    appointment_type: AppointmentType,
    meeting_link: Option<&str>,
) -> Result<(), ScheduleError> {
    if appointment_type != AppointmentType::Online {
        return Ok(());
    }
    match meeting_link.map(str::trim) {
        None | Some("") => Err(ScheduleError::Validation(
            "Online appointments require a meeting link".to_string(),
        )),
        Some(link) if !(link.starts_with("https://") || link.starts_with("http://")) => Err(
            ScheduleError::Validation("Meeting link must be an http(s) URL".to_string()),
        ),
        Some(_) => Ok(()),
    }
}

// ==============================================================================
// CALENDAR VIEW MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SlotStatus {
    Empty,
    DoctorFree,
    BookedByUser,
    BookedByOther,
    Past,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Empty => "empty",
            SlotStatus::DoctorFree => "doctor-free",
            SlotStatus::BookedByUser => "booked-by-user",
            SlotStatus::BookedByOther => "booked-by-other",
            SlotStatus::Past => "past",
        }
    }

    pub fn is_past(&self) -> bool {
        matches!(self, SlotStatus::Past)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SlotAction {
    NoOp,
    CreateSlot,
    BookSlot,
    OpenDetail,
}

/// How the viewing identity relates to the calendar being shown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
    /// The doctor whose schedule this is.
    Owner,
    Patient,
    /// Anyone else (admins, other doctors). Read-only.
    Observer,
}

impl ViewerRole {
    pub fn for_calendar(session: &Session, doctor_id: &str) -> Self {
        if session.user_id() == doctor_id {
            return ViewerRole::Owner;
        }
        match session.role() {
            Role::Patient => ViewerRole::Patient,
            Role::Doctor | Role::Admin => ViewerRole::Observer,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCell {
    pub day: NaiveDate,
    pub slot: TimeSlot,
    /// Effective status, `Past` once the slot has elapsed.
    pub status: SlotStatus,
    /// Classification ignoring time; kept so elapsed cells still render as
    /// free or booked.
    pub occupancy: SlotStatus,
    pub entry_id: Option<String>,
}

impl CalendarCell {
    pub fn is_interactive(&self) -> bool {
        !self.status.is_past()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarGrid {
    pub doctor_id: String,
    pub viewer_role: ViewerRole,
    pub days: [NaiveDate; 7],
    pub slots: Vec<TimeSlot>,
    /// Row-major by slot: `rows[slot_index][day_index]`.
    pub rows: Vec<Vec<CalendarCell>>,
    pub evaluated_at: NaiveDateTime,
}

impl CalendarGrid {
    pub fn cell(&self, day_index: usize, slot_index: usize) -> Option<&CalendarCell> {
        self.rows.get(slot_index)?.get(day_index)
    }

    pub fn cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.rows.iter().flatten()
    }

    pub fn count(&self, status: SlotStatus) -> usize {
        self.cells().filter(|c| c.status == status).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarEvent {
    Refreshed { entries: usize },
    WeekChanged { start: NaiveDate },
    SlotsElapsed { count: usize },
}

// ==============================================================================
// SERDE HELPERS
// ==============================================================================

/// `HH:MM` wall-clock times. Seconds are accepted on input.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("Invalid time '{}': {}", s, e)))
    }
}

/// ISO-8601 dates truncated to the day. `2025-07-07T00:00:00.000Z` and
/// `2025-07-07` both decode to 2025-07-07.
mod day_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse(s: &str) -> Result<NaiveDate, String> {
        let day = s.trim().get(..10).unwrap_or(s);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|e| format!("Invalid date '{}': {}", s, e))
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| super::parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// References that arrive either as a bare id or as a populated object
/// carrying `_id`/`id`.
mod id_ref {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn extract(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Object(map) => map
                .get("_id")
                .or_else(|| map.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }

    pub fn required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        extract(value).ok_or_else(|| serde::de::Error::custom("expected an id or an object with an id"))
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(extract))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_standard_slots_are_hourly_and_labelled() {
        let slots = standard_time_slots();
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].label(), "09AM - 10AM");
        assert_eq!(slots[3].label(), "12PM - 01PM");
        assert_eq!(slots[7].label(), "04PM - 05PM");
    }

    #[test]
    fn test_entry_decodes_datetime_date_and_populated_refs() {
        let entry: ScheduleEntry = serde_json::from_value(json!({
            "_id": "s-1",
            "doctor": { "_id": "doc-1", "name": "Dr. Who" },
            "date": "2025-07-07T00:00:00.000Z",
            "timeSlot": { "startTime": "09:00", "endTime": "10:00" },
            "patient": { "_id": "pat-1" },
            "status": "booked",
            "appointmentType": "online",
            "meetingLink": "https://meet.example.com/abc"
        }))
        .unwrap();

        assert_eq!(entry.id, "s-1");
        assert_eq!(entry.doctor_id, "doc-1");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2025, 7, 7).unwrap());
        assert_eq!(entry.time_slot.start_time, time(9, 0));
        assert_eq!(entry.patient_id(), Some("pat-1"));
        assert_eq!(entry.status, EntryStatus::Booked);
    }

    #[test]
    fn test_entry_with_null_patient_is_unbooked() {
        let entry: ScheduleEntry = serde_json::from_value(json!({
            "id": "s-2",
            "doctorId": "doc-1",
            "date": "2025-07-08",
            "timeSlot": { "startTime": "10:00:00", "endTime": "11:00:00" },
            "patient": null,
            "status": "created"
        }))
        .unwrap();

        assert!(!entry.is_booked());
        assert!(entry.is_deletable());
        assert_eq!(entry.appointment_type, AppointmentType::Offline);
    }

    #[test]
    fn test_create_request_serializes_wire_shape() {
        let slot = standard_time_slots()[0];
        let request = CreateScheduleRequest::new(
            "doc-1",
            NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
            slot,
            SlotDetails::offline(),
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["doctor"], "doc-1");
        assert_eq!(value["date"], "2025-07-07");
        assert_eq!(value["timeSlot"]["startTime"], "09:00");
        assert_eq!(value["appointmentType"], "offline");
        assert!(value.get("meetingLink").is_none());
    }

    #[test]
    fn test_online_slot_requires_meeting_link() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let slot = standard_time_slots()[0];

        let mut details = SlotDetails::online("");
        let request = CreateScheduleRequest::new("doc-1", day, slot, details.clone());
        assert!(matches!(request.validate(), Err(ScheduleError::Validation(_))));

        details.meeting_link = Some("meet.example.com".to_string());
        let request = CreateScheduleRequest::new("doc-1", day, slot, details);
        assert!(matches!(request.validate(), Err(ScheduleError::Validation(_))));

        let request = CreateScheduleRequest::new(
            "doc-1",
            day,
            slot,
            SlotDetails::online("https://meet.example.com/abc"),
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_switching_to_online_uses_existing_link() {
        let entry = ScheduleEntry {
            id: "s-1".to_string(),
            doctor_id: "doc-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
            time_slot: standard_time_slots()[0],
            patient: None,
            status: EntryStatus::Created,
            appointment_type: AppointmentType::Offline,
            notes: None,
            meeting_link: Some("https://meet.example.com/abc".to_string()),
            unreadable: false,
        };

        let request = UpdateScheduleRequest {
            appointment_type: Some(AppointmentType::Online),
            ..Default::default()
        };
        assert!(request.validate_against(&entry).is_ok());
        assert!(matches!(
            UpdateScheduleRequest::default().validate_against(&entry),
            Err(ScheduleError::Validation(_))
        ));
    }

    #[test]
    fn test_decode_keeps_position_of_malformed_record() {
        let raw = json!({
            "_id": "s-3",
            "date": "2025-07-09T00:00:00.000Z",
            "timeSlot": { "startTime": "11:00", "endTime": "12:00" },
            "patient": { "_id": "pat-9" },
            "status": "cancelled"
        });

        let entry = ScheduleEntry::decode(&raw, "doc-1").unwrap();
        assert!(entry.unreadable);
        assert_eq!(entry.doctor_id, "doc-1");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2025, 7, 9).unwrap());
        assert_eq!(entry.time_slot.start_time, time(11, 0));
        assert!(!entry.is_deletable());

        let hopeless = json!({ "_id": "s-4", "status": "created" });
        assert!(ScheduleEntry::decode(&hopeless, "doc-1").is_err());
    }

    #[test]
    fn test_time_slot_rejects_inverted_bounds() {
        assert!(TimeSlot::new(time(10, 0), time(9, 0)).is_err());
        assert!(TimeSlot::new(time(9, 0), time(9, 30)).is_ok());
    }
}
