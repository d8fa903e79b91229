// Expansion of schedule rows into concrete occurrences, end to end through
// the model's spec builder.

mod common;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use pretty_assertions::assert_eq;
use uuid::Uuid;
use workout_tracker::engine::recurrence::{next_occurrence, upcoming_occurrences};
use workout_tracker::models::RecurrencePattern;

use common::MockData;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[test]
fn weekly_schedule_expands_to_configured_days() {
    let mut schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    schedule.multiple_days_of_week = Some("1,3".to_string()); // Mon, Wed

    let spec = schedule.recurrence_spec();
    assert_eq!(spec.days_of_week, vec![Weekday::Mon, Weekday::Wed]);

    // Tuesday morning rolls to Wednesday at the default 17:00.
    let next = next_occurrence(&spec, at(2024, 6, 4, 10, 0)).unwrap();
    assert_eq!(next, at(2024, 6, 5, 17, 0));
}

#[test]
fn same_day_occurrence_counts_while_time_is_ahead() {
    let mut schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    schedule.multiple_days_of_week = Some("3".to_string()); // Wed

    let spec = schedule.recurrence_spec();
    // Wednesday 10:00 still hits Wednesday 17:00...
    assert_eq!(
        next_occurrence(&spec, at(2024, 6, 5, 10, 0)).unwrap(),
        at(2024, 6, 5, 17, 0)
    );
    // ...but Wednesday 18:00 rolls a full week.
    assert_eq!(
        next_occurrence(&spec, at(2024, 6, 5, 18, 0)).unwrap(),
        at(2024, 6, 12, 17, 0)
    );
}

#[test]
fn weekly_without_days_falls_back_to_start_weekday() {
    let schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    // Start date 2024-06-01 is a Saturday.
    let spec = schedule.recurrence_spec();
    assert_eq!(spec.days_of_week, vec![Weekday::Sat]);

    let next = next_occurrence(&spec, at(2024, 6, 4, 10, 0)).unwrap();
    assert_eq!(next, at(2024, 6, 8, 17, 0));
}

#[test]
fn invalid_weekday_entries_are_skipped() {
    let mut schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    schedule.recurrence_day_of_week = Some(2);
    schedule.multiple_days_of_week = Some("9,notaday,4".to_string());

    let spec = schedule.recurrence_spec();
    assert_eq!(spec.days_of_week, vec![Weekday::Tue, Weekday::Thu]);
}

#[test]
fn biweekly_skips_odd_weeks_from_start() {
    let mut schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    schedule.recurrence_pattern = RecurrencePattern::BiWeekly;
    schedule.start_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(); // Monday
    schedule.recurrence_day_of_week = Some(1);

    let spec = schedule.recurrence_spec();
    // The Monday one week out is an odd cycle; the next even one is Jan 15.
    let next = next_occurrence(&spec, at(2024, 1, 2, 0, 0)).unwrap();
    assert_eq!(next, at(2024, 1, 15, 17, 0));
}

#[test]
fn monthly_clamps_to_short_months() {
    let mut schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    schedule.recurrence_pattern = RecurrencePattern::Monthly;
    schedule.recurrence_day_of_month = Some(31);

    let spec = schedule.recurrence_spec();
    let next = next_occurrence(&spec, at(2024, 2, 10, 0, 0)).unwrap();
    assert_eq!(next, at(2024, 2, 29, 17, 0)); // leap year February
}

#[test]
fn once_schedules_have_no_next_occurrence() {
    let mut schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    schedule.recurrence_pattern = RecurrencePattern::Once;
    schedule.is_recurring = false;

    assert_eq!(
        next_occurrence(&schedule.recurrence_spec(), at(2024, 6, 4, 10, 0)),
        None
    );
}

#[test]
fn upcoming_occurrences_stop_at_end_date() {
    let mut schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    schedule.start_date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(); // Monday
    schedule.end_date = NaiveDate::from_ymd_opt(2024, 6, 17);
    schedule.recurrence_day_of_week = Some(1);

    let occurrences =
        upcoming_occurrences(&schedule.recurrence_spec(), at(2024, 6, 1, 0, 0), 5);
    assert_eq!(
        occurrences,
        vec![
            at(2024, 6, 3, 17, 0),
            at(2024, 6, 10, 17, 0),
            at(2024, 6, 17, 17, 0),
        ]
    );
}

#[test]
fn explicit_time_of_day_overrides_default() {
    let mut schedule = MockData::schedule(Uuid::new_v4(), Uuid::new_v4());
    schedule.recurrence_day_of_week = Some(1);
    schedule.scheduled_datetime = Some(at(2024, 6, 3, 6, 30).and_utc());

    let spec = schedule.recurrence_spec();
    let next = next_occurrence(&spec, at(2024, 6, 4, 10, 0)).unwrap();
    assert_eq!(next, at(2024, 6, 10, 6, 30));
}
