use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::models::RecurrencePattern;

/// Everything the expander needs to know about a schedule's recurrence,
/// decoupled from the database row.
#[derive(Debug, Clone)]
pub struct RecurrenceSpec {
    pub pattern: RecurrencePattern,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub days_of_week: Vec<Weekday>,
    pub day_of_month: Option<u32>,
    pub time_of_day: NaiveTime,
}

/// Computes the next occurrence strictly after `reference` (same-day
/// occurrences count only while their time of day is still ahead).
///
/// Returns `None` for one-time schedules, for schedules past their end date,
/// and for weekly patterns without a resolvable weekday set.
pub fn next_occurrence(spec: &RecurrenceSpec, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Some(end) = spec.end_date {
        if end < reference.date() {
            return None;
        }
    }

    let result = match spec.pattern {
        // One-time schedules carry their own datetime; there is no "next".
        RecurrencePattern::Once => None,
        RecurrencePattern::Daily => next_daily(spec, reference),
        RecurrencePattern::Weekly => next_weekly(spec, reference),
        RecurrencePattern::BiWeekly => next_biweekly(spec, reference),
        RecurrencePattern::Monthly => Some(next_monthly(spec, reference)),
    };

    result.filter(|occurrence| match spec.end_date {
        Some(end) => occurrence.date() <= end,
        None => true,
    })
}

/// Expands the next `count` occurrences after `reference`, for schedule
/// previews.
pub fn upcoming_occurrences(
    spec: &RecurrenceSpec,
    reference: NaiveDateTime,
    count: usize,
) -> Vec<NaiveDateTime> {
    let mut occurrences = Vec::with_capacity(count);
    let mut cursor = reference;

    while occurrences.len() < count {
        match next_occurrence(spec, cursor) {
            Some(next) => {
                cursor = next + Duration::minutes(1);
                occurrences.push(next);
            }
            None => break,
        }
    }

    occurrences
}

/// The most recent occurrence strictly before `reference`, scanning back up
/// to `lookback_days`. Lets the missed-occurrence sweep see what should have
/// happened while the processor was not running.
pub fn previous_occurrence(
    spec: &RecurrenceSpec,
    reference: NaiveDateTime,
    lookback_days: i64,
) -> Option<NaiveDateTime> {
    let mut cursor = reference - Duration::days(lookback_days);
    let mut last = None;

    while let Some(next) = next_occurrence(spec, cursor) {
        if next >= reference {
            break;
        }
        cursor = next + Duration::minutes(1);
        last = Some(next);
    }

    last
}

fn next_daily(spec: &RecurrenceSpec, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    let date = if spec.time_of_day > reference.time() {
        reference.date()
    } else {
        reference.date().succ_opt()?
    };
    Some(date.and_time(spec.time_of_day))
}

fn next_weekly(spec: &RecurrenceSpec, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    if spec.days_of_week.is_empty() {
        return None;
    }

    // First pass: the next 7 days, counting today only if the time of day is
    // still ahead.
    let mut date = reference.date();
    for _ in 0..7 {
        if spec.days_of_week.contains(&date.weekday()) {
            if date != reference.date() || spec.time_of_day > reference.time() {
                return Some(date.and_time(spec.time_of_day));
            }
        }
        date = date.succ_opt()?;
    }

    // Nothing matched within a week, so take the first configured weekday
    // after the reference date.
    let mut date = reference.date().succ_opt()?;
    while !spec.days_of_week.contains(&date.weekday()) {
        date = date.succ_opt()?;
    }
    Some(date.and_time(spec.time_of_day))
}

fn next_biweekly(spec: &RecurrenceSpec, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    if spec.days_of_week.is_empty() {
        return None;
    }

    // Look ahead two weeks; only weeks at an even offset from the start date
    // count as occurrences.
    let mut date = reference.date();
    for _ in 0..14 {
        if spec.days_of_week.contains(&date.weekday()) {
            let weeks_since_start =
                ((date - spec.start_date).num_days() as f64 / 7.0).round() as i64;
            if weeks_since_start % 2 == 0
                && (date != reference.date() || spec.time_of_day > reference.time())
            {
                return Some(date.and_time(spec.time_of_day));
            }
        }
        date = date.succ_opt()?;
    }

    // No occurrence in the window: jump to the start of the next even cycle
    // and take its first configured weekday.
    let current_weeks = (reference.date() - spec.start_date).num_days().div_euclid(7);
    let weeks_to_add = if current_weeks % 2 == 0 { 2 } else { 1 };
    let mut date = spec.start_date + Duration::weeks(current_weeks + weeks_to_add);
    for _ in 0..7 {
        if spec.days_of_week.contains(&date.weekday()) {
            return Some(date.and_time(spec.time_of_day));
        }
        date = date.succ_opt()?;
    }
    None
}

fn next_monthly(spec: &RecurrenceSpec, reference: NaiveDateTime) -> NaiveDateTime {
    let day_of_month = spec.day_of_month.unwrap_or_else(|| spec.start_date.day());

    let due_this_month = reference.day() < day_of_month
        || (reference.day() == day_of_month && reference.time() < spec.time_of_day);

    let (year, month) = if due_this_month {
        (reference.year(), reference.month())
    } else if reference.month() == 12 {
        (reference.year() + 1, 1)
    } else {
        (reference.year(), reference.month() + 1)
    };

    // Day 29/30/31 clamps to the last day of short months.
    let day = day_of_month.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or(spec.start_date)
        .and_time(spec.time_of_day)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn spec(pattern: RecurrencePattern) -> RecurrenceSpec {
        RecurrenceSpec {
            pattern,
            // 2024-01-01 is a Monday
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            days_of_week: vec![],
            day_of_month: None,
            time_of_day: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
    }

    #[test]
    fn once_has_no_next_occurrence() {
        let spec = spec(RecurrencePattern::Once);
        assert_eq!(next_occurrence(&spec, at(2024, 1, 1, 8, 0)), None);
    }

    #[test]
    fn daily_same_day_when_time_ahead() {
        let spec = spec(RecurrencePattern::Daily);
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 10, 8, 0)),
            Some(at(2024, 1, 10, 17, 0))
        );
    }

    #[test]
    fn daily_rolls_to_tomorrow_when_time_passed() {
        let spec = spec(RecurrencePattern::Daily);
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 10, 18, 0)),
            Some(at(2024, 1, 11, 17, 0))
        );
    }

    #[test]
    fn weekly_picks_earliest_configured_day() {
        let mut spec = spec(RecurrencePattern::Weekly);
        spec.days_of_week = vec![Weekday::Mon, Weekday::Fri];
        // Wednesday 2024-01-10 -> Friday 2024-01-12
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 10, 8, 0)),
            Some(at(2024, 1, 12, 17, 0))
        );
    }

    #[test]
    fn weekly_same_day_respects_time_of_day() {
        let mut spec = spec(RecurrencePattern::Weekly);
        spec.days_of_week = vec![Weekday::Wed];
        // Wednesday morning: today still counts
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 10, 8, 0)),
            Some(at(2024, 1, 10, 17, 0))
        );
        // Wednesday evening: roll a full week
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 10, 18, 0)),
            Some(at(2024, 1, 17, 17, 0))
        );
    }

    #[test]
    fn weekly_without_days_returns_none() {
        let spec = spec(RecurrencePattern::Weekly);
        assert_eq!(next_occurrence(&spec, at(2024, 1, 10, 8, 0)), None);
    }

    #[test]
    fn weekly_stops_at_end_date() {
        let mut spec = spec(RecurrencePattern::Weekly);
        spec.days_of_week = vec![Weekday::Fri];
        spec.end_date = Some(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        // Next Friday is the 12th, past the end date
        assert_eq!(next_occurrence(&spec, at(2024, 1, 10, 8, 0)), None);
    }

    #[test]
    fn end_date_before_reference_returns_none() {
        let mut spec = spec(RecurrencePattern::Daily);
        spec.end_date = Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(next_occurrence(&spec, at(2024, 1, 10, 8, 0)), None);
    }

    #[test]
    fn biweekly_skips_odd_weeks() {
        let mut spec = spec(RecurrencePattern::BiWeekly);
        spec.days_of_week = vec![Weekday::Mon];
        // Start Monday 2024-01-01 (week 0). Week 1 Monday is 2024-01-08 and
        // must be skipped; week 2 Monday is 2024-01-15.
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 2, 8, 0)),
            Some(at(2024, 1, 15, 17, 0))
        );
    }

    #[test]
    fn biweekly_hits_even_week() {
        let mut spec = spec(RecurrencePattern::BiWeekly);
        spec.days_of_week = vec![Weekday::Mon];
        // Sunday 2024-01-14, the next day is an even-week Monday
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 14, 8, 0)),
            Some(at(2024, 1, 15, 17, 0))
        );
    }

    #[test]
    fn biweekly_same_day_time_passed_jumps_two_weeks() {
        let mut spec = spec(RecurrencePattern::BiWeekly);
        spec.days_of_week = vec![Weekday::Mon];
        // Even-week Monday evening: next even-week Monday is 14 days out
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 15, 18, 0)),
            Some(at(2024, 1, 29, 17, 0))
        );
    }

    #[test]
    fn monthly_same_month_when_day_ahead() {
        let mut spec = spec(RecurrencePattern::Monthly);
        spec.day_of_month = Some(15);
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 10, 8, 0)),
            Some(at(2024, 1, 15, 17, 0))
        );
    }

    #[test]
    fn monthly_rolls_to_next_month_when_day_passed() {
        let mut spec = spec(RecurrencePattern::Monthly);
        spec.day_of_month = Some(15);
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 20, 8, 0)),
            Some(at(2024, 2, 15, 17, 0))
        );
    }

    #[test]
    fn monthly_same_day_respects_time_of_day() {
        let mut spec = spec(RecurrencePattern::Monthly);
        spec.day_of_month = Some(15);
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 15, 8, 0)),
            Some(at(2024, 1, 15, 17, 0))
        );
        assert_eq!(
            next_occurrence(&spec, at(2024, 1, 15, 18, 0)),
            Some(at(2024, 2, 15, 17, 0))
        );
    }

    #[test]
    fn monthly_day_31_clamps_to_short_months() {
        let mut spec = spec(RecurrencePattern::Monthly);
        spec.day_of_month = Some(31);
        // February 2024 (leap year) has 29 days
        assert_eq!(
            next_occurrence(&spec, at(2024, 2, 1, 8, 0)),
            Some(at(2024, 2, 29, 17, 0))
        );
        // April has 30
        assert_eq!(
            next_occurrence(&spec, at(2024, 4, 1, 8, 0)),
            Some(at(2024, 4, 30, 17, 0))
        );
    }

    #[test]
    fn monthly_december_wraps_to_january() {
        let mut spec = spec(RecurrencePattern::Monthly);
        spec.day_of_month = Some(10);
        assert_eq!(
            next_occurrence(&spec, at(2024, 12, 20, 8, 0)),
            Some(at(2025, 1, 10, 17, 0))
        );
    }

    #[test]
    fn monthly_falls_back_to_start_date_day() {
        let mut spec = spec(RecurrencePattern::Monthly);
        spec.start_date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        spec.day_of_month = None;
        assert_eq!(
            next_occurrence(&spec, at(2024, 3, 1, 8, 0)),
            Some(at(2024, 3, 5, 17, 0))
        );
    }

    #[test]
    fn upcoming_expands_in_order() {
        let mut spec = spec(RecurrencePattern::Weekly);
        spec.days_of_week = vec![Weekday::Mon, Weekday::Thu];
        let dates = upcoming_occurrences(&spec, at(2024, 1, 9, 8, 0), 4);
        assert_eq!(
            dates,
            vec![
                at(2024, 1, 11, 17, 0),
                at(2024, 1, 15, 17, 0),
                at(2024, 1, 18, 17, 0),
                at(2024, 1, 22, 17, 0),
            ]
        );
    }

    #[test]
    fn upcoming_truncates_at_end_date() {
        let mut spec = spec(RecurrencePattern::Weekly);
        spec.days_of_week = vec![Weekday::Mon];
        spec.end_date = Some(NaiveDate::from_ymd_opt(2024, 1, 22).unwrap());
        let dates = upcoming_occurrences(&spec, at(2024, 1, 9, 8, 0), 5);
        assert_eq!(dates, vec![at(2024, 1, 15, 17, 0), at(2024, 1, 22, 17, 0)]);
    }

    #[test]
    fn previous_occurrence_finds_last_before_reference() {
        let mut spec = spec(RecurrencePattern::Weekly);
        spec.days_of_week = vec![Weekday::Mon];
        // Wednesday 2024-01-17: the last Monday was the 15th.
        assert_eq!(
            previous_occurrence(&spec, at(2024, 1, 17, 8, 0), 7),
            Some(at(2024, 1, 15, 17, 0))
        );
    }

    #[test]
    fn previous_occurrence_excludes_the_reference_instant() {
        let spec_daily = spec(RecurrencePattern::Daily);
        // Reference exactly at an occurrence: only yesterday's counts.
        assert_eq!(
            previous_occurrence(&spec_daily, at(2024, 1, 10, 17, 0), 2),
            Some(at(2024, 1, 9, 17, 0))
        );
    }

    #[test]
    fn previous_occurrence_none_outside_lookback() {
        let mut spec = spec(RecurrencePattern::Monthly);
        spec.day_of_month = Some(1);
        // Looking back 7 days from the 20th never reaches the 1st.
        assert_eq!(previous_occurrence(&spec, at(2024, 1, 20, 8, 0), 7), None);
    }
}
