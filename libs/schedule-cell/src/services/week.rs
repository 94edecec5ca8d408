use chrono::{Days, NaiveDate, Weekday};
use serde::Serialize;

/// Seven consecutive days, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WeekWindow {
    days: [NaiveDate; 7],
}

impl WeekWindow {
    pub fn containing(reference: NaiveDate) -> Self {
        let monday = reference.week(Weekday::Mon).first_day();
        let mut days = [monday; 7];
        for (slot, day) in days.iter_mut().zip(monday.iter_days()) {
            *slot = day;
        }
        Self { days }
    }

    pub fn days(&self) -> &[NaiveDate; 7] {
        &self.days
    }

    pub fn start(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn end(&self) -> NaiveDate {
        self.days[6]
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start() <= day && day <= self.end()
    }

    pub fn index_of(&self, day: NaiveDate) -> Option<usize> {
        self.days.iter().position(|d| *d == day)
    }

    /// The window `weeks` weeks away; `None` past the representable calendar.
    pub fn shifted(&self, weeks: i64) -> Option<Self> {
        shift_weeks(self.start(), weeks).map(Self::containing)
    }
}

pub fn week_window(reference: NaiveDate) -> WeekWindow {
    WeekWindow::containing(reference)
}

/// Moves a reference date by whole weeks.
pub fn shift_weeks(reference: NaiveDate, weeks: i64) -> Option<NaiveDate> {
    let days = weeks.unsigned_abs().checked_mul(7)?;
    if weeks >= 0 {
        reference.checked_add_days(Days::new(days))
    } else {
        reference.checked_sub_days(Days::new(days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_midweek_reference_yields_monday_to_sunday() {
        let window = week_window(date(2025, 7, 9));

        assert_eq!(window.start(), date(2025, 7, 7));
        assert_eq!(window.end(), date(2025, 7, 13));
        assert_eq!(window.start().weekday(), Weekday::Mon);
        assert_eq!(window.end().weekday(), Weekday::Sun);
        assert_eq!(window.index_of(date(2025, 7, 9)), Some(2));
    }

    #[test]
    fn test_monday_and_sunday_belong_to_their_own_week() {
        assert_eq!(week_window(date(2025, 7, 7)).start(), date(2025, 7, 7));
        assert_eq!(week_window(date(2025, 7, 13)).start(), date(2025, 7, 7));
        assert_eq!(week_window(date(2025, 7, 14)).start(), date(2025, 7, 14));
    }

    #[test]
    fn test_window_spanning_month_and_year_boundaries() {
        let window = week_window(date(2025, 1, 1));
        assert_eq!(window.start(), date(2024, 12, 30));
        assert_eq!(window.end(), date(2025, 1, 5));
        assert!(window.contains(date(2024, 12, 31)));
        assert!(!window.contains(date(2025, 1, 6)));
    }

    #[test]
    fn test_navigate_forward_then_back_is_identity() {
        for offset in 0..14 {
            let reference = date(2025, 7, 1) + chrono::Duration::days(offset);
            let original = week_window(reference);

            let forward = shift_weeks(reference, 1).unwrap();
            let back = shift_weeks(forward, -1).unwrap();

            assert_eq!(week_window(back), original);
            assert_eq!(original.shifted(1).and_then(|w| w.shifted(-1)), Some(original));
        }
    }

    #[test]
    fn test_shift_by_several_weeks() {
        assert_eq!(shift_weeks(date(2025, 7, 9), 3), Some(date(2025, 7, 30)));
        assert_eq!(shift_weeks(date(2025, 7, 9), -2), Some(date(2025, 6, 25)));
        assert_eq!(shift_weeks(date(2025, 7, 9), i64::MIN), None);
    }
}
