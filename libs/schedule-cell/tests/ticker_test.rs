// libs/schedule-cell/tests/ticker_test.rs
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use schedule_cell::{
    CalendarEvent, CalendarViewModel, CreateScheduleRequest, ManualClock, ScheduleEntry,
    ScheduleError, ScheduleStore, SlotStatus, StatusTicker, UpdateScheduleRequest,
};
use shared_models::auth::Session;
use shared_utils::test_utils::TestUser;

struct EmptyStore;

#[async_trait]
impl ScheduleStore for EmptyStore {
    async fn fetch_own_entries(&self, _: &Session) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        Ok(Vec::new())
    }

    async fn fetch_doctor_entries(&self, _: &str, _: &Session) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        Ok(Vec::new())
    }

    async fn create_entry(&self, _: &CreateScheduleRequest, _: &Session) -> Result<ScheduleEntry, ScheduleError> {
        Err(ScheduleError::Validation("read-only".to_string()))
    }

    async fn update_entry(&self, _: &str, _: &UpdateScheduleRequest, _: &Session) -> Result<ScheduleEntry, ScheduleError> {
        Err(ScheduleError::Validation("read-only".to_string()))
    }

    async fn delete_entry(&self, _: &str, _: &Session) -> Result<(), ScheduleError> {
        Err(ScheduleError::Validation("read-only".to_string()))
    }

    async fn reject_booking(&self, _: &str, _: &Session) -> Result<ScheduleEntry, ScheduleError> {
        Err(ScheduleError::Validation("read-only".to_string()))
    }
}

fn monday(h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, 7)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_ticker_flips_elapsed_slots_and_stops() {
    let clock = Arc::new(ManualClock::new(monday(8)));
    let session = TestUser::doctor("doc@example.com").with_id("doc-1").to_session();
    let vm = Arc::new(CalendarViewModel::new(
        Arc::new(EmptyStore),
        clock.clone(),
        session,
        "doc-1",
    ));
    vm.refresh().await.unwrap();
    let mut events = vm.subscribe();

    let ticker = StatusTicker::new(Arc::clone(&vm), Duration::from_secs(60)).unwrap();
    let handle = ticker.start();

    clock.set(monday(10));
    let event = tokio::time::timeout(Duration::from_secs(300), events.recv())
        .await
        .expect("ticker should report elapsed slots")
        .unwrap();
    assert_eq!(event, CalendarEvent::SlotsElapsed { count: 1 });

    let first = vm.grid().await;
    assert_eq!(first.cell(0, 0).unwrap().status, SlotStatus::Past);
    assert_eq!(first.cell(0, 1).unwrap().status, SlotStatus::Empty);

    ticker.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("ticker should stop after shutdown")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ticker_is_quiet_while_time_stands_still() {
    let clock = Arc::new(ManualClock::new(monday(8)));
    let session = TestUser::patient("pat@example.com").to_session();
    let vm = Arc::new(CalendarViewModel::new(
        Arc::new(EmptyStore),
        clock,
        session,
        "doc-1",
    ));
    let mut events = vm.subscribe();

    let ticker = StatusTicker::new(Arc::clone(&vm), Duration::from_secs(60)).unwrap();
    let handle = ticker.start();

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert!(events.try_recv().is_err());

    ticker.shutdown();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_zero_period_is_rejected() {
    let clock = Arc::new(ManualClock::new(monday(8)));
    let session = TestUser::patient("pat@example.com").to_session();
    let vm = Arc::new(CalendarViewModel::new(
        Arc::new(EmptyStore),
        clock,
        session,
        "doc-1",
    ));

    assert_matches!(
        StatusTicker::new(vm, Duration::ZERO),
        Err(ScheduleError::Validation(_))
    );
}
