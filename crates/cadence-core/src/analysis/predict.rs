//! Next-occurrence prediction
//!
//! Pure date arithmetic: the caller decides whether a pattern deserves a
//! prediction at all (irregular patterns can be suppressed by config);
//! this module only answers "given the last date and the cadence, when is
//! the next one expected".

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::models::Frequency;

/// Predict the next expected date after `last`.
///
/// - Daily/weekly/biweekly add a fixed day count. When a typical weekday
///   is known and the raw result lands within three days before it, the
///   prediction is nudged forward onto that weekday.
/// - Monthly, quarterly, and semi-annual add calendar months, then anchor
///   to the typical day of month (falling back to `last`'s day), clamped
///   to the target month's length. A day-31 anchor lands on Feb 29 in a
///   leap year and Apr 30 in April.
/// - Annual adds twelve months with length clamping only; the typical day
///   of month is ignored because a yearly charge keeps its own date.
/// - Irregular is treated as monthly; callers that do not want irregular
///   predictions skip calling this.
pub fn predict_next_date(
    last: NaiveDate,
    frequency: Frequency,
    typical_day_of_month: Option<u32>,
    typical_weekday: Option<Weekday>,
) -> NaiveDate {
    match frequency {
        Frequency::Daily => last + Duration::days(1),
        Frequency::Weekly => nudge_to_weekday(last + Duration::days(7), typical_weekday),
        Frequency::Biweekly => nudge_to_weekday(last + Duration::days(14), typical_weekday),
        Frequency::Monthly | Frequency::Irregular => {
            add_months_anchored(last, 1, typical_day_of_month)
        }
        Frequency::Quarterly => add_months_anchored(last, 3, typical_day_of_month),
        Frequency::SemiAnnual => add_months_anchored(last, 6, typical_day_of_month),
        Frequency::Annual => add_months_anchored(last, 12, None),
    }
}

/// Add `months` to `last`, anchoring to `typical_day` (or `last`'s own day)
/// clamped into the target month.
fn add_months_anchored(last: NaiveDate, months: u32, typical_day: Option<u32>) -> NaiveDate {
    let total = last.year() * 12 + last.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    let day = typical_day.unwrap_or_else(|| last.day()).min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 1).expect("valid month start"))
}

/// Shift `date` forward onto `target` when it falls one to three days
/// before it; otherwise leave it alone. A larger gap means the raw
/// arithmetic already landed on (or past) the anchor in the other
/// direction and pushing forward would overshoot.
fn nudge_to_weekday(date: NaiveDate, target: Option<Weekday>) -> NaiveDate {
    let Some(target) = target else { return date };
    let offset = (target.num_days_from_sunday() as i64
        - date.weekday().num_days_from_sunday() as i64)
        .rem_euclid(7);
    if (1..=3).contains(&offset) {
        date + Duration::days(offset)
    } else {
        date
    }
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_daily_and_weekly_arithmetic() {
        assert_eq!(predict_next_date(d(2024, 3, 10), Frequency::Daily, None, None), d(2024, 3, 11));
        assert_eq!(predict_next_date(d(2024, 3, 10), Frequency::Weekly, None, None), d(2024, 3, 17));
        assert_eq!(
            predict_next_date(d(2024, 3, 10), Frequency::Biweekly, None, None),
            d(2024, 3, 24)
        );
    }

    #[test]
    fn test_monthly_rollover() {
        assert_eq!(
            predict_next_date(d(2024, 3, 15), Frequency::Monthly, Some(15), None),
            d(2024, 4, 15)
        );
        assert_eq!(
            predict_next_date(d(2024, 12, 15), Frequency::Monthly, Some(15), None),
            d(2025, 1, 15)
        );
    }

    #[test]
    fn test_monthly_day_31_clamps_to_leap_february() {
        assert_eq!(
            predict_next_date(d(2024, 1, 31), Frequency::Monthly, Some(31), None),
            d(2024, 2, 29)
        );
        assert_eq!(
            predict_next_date(d(2023, 1, 31), Frequency::Monthly, Some(31), None),
            d(2023, 2, 28)
        );
    }

    #[test]
    fn test_monthly_day_31_clamps_to_thirty_day_month() {
        assert_eq!(
            predict_next_date(d(2024, 3, 31), Frequency::Monthly, Some(31), None),
            d(2024, 4, 30)
        );
    }

    #[test]
    fn test_monthly_anchor_overrides_last_day() {
        // Last charge slipped to the 16th, the anchor pulls it back
        assert_eq!(
            predict_next_date(d(2024, 3, 16), Frequency::Monthly, Some(15), None),
            d(2024, 4, 15)
        );
    }

    #[test]
    fn test_monthly_without_anchor_uses_last_day() {
        assert_eq!(
            predict_next_date(d(2024, 3, 16), Frequency::Monthly, None, None),
            d(2024, 4, 16)
        );
    }

    #[test]
    fn test_quarterly_and_semi_annual() {
        assert_eq!(
            predict_next_date(d(2024, 1, 31), Frequency::Quarterly, Some(31), None),
            d(2024, 4, 30)
        );
        assert_eq!(
            predict_next_date(d(2024, 2, 29), Frequency::SemiAnnual, None, None),
            d(2024, 8, 29)
        );
    }

    #[test]
    fn test_annual_ignores_day_anchor_but_clamps_leap_day() {
        // Feb 29 has no counterpart next year
        assert_eq!(
            predict_next_date(d(2024, 2, 29), Frequency::Annual, Some(15), None),
            d(2025, 2, 28)
        );
        assert_eq!(
            predict_next_date(d(2024, 6, 10), Frequency::Annual, Some(15), None),
            d(2025, 6, 10)
        );
    }

    #[test]
    fn test_weekly_nudges_onto_typical_weekday() {
        // 2024-03-10 is a Sunday; +7 lands on Sunday, two days short of a
        // Tuesday anchor, so the prediction moves to Tuesday
        assert_eq!(
            predict_next_date(d(2024, 3, 10), Frequency::Weekly, None, Some(Weekday::Tue)),
            d(2024, 3, 19)
        );
        // Already on the anchor: no nudge
        assert_eq!(
            predict_next_date(d(2024, 3, 10), Frequency::Weekly, None, Some(Weekday::Sun)),
            d(2024, 3, 17)
        );
    }

    #[test]
    fn test_weekly_far_offset_is_not_nudged() {
        // Five days forward to Friday would overshoot; keep the raw date
        assert_eq!(
            predict_next_date(d(2024, 3, 10), Frequency::Weekly, None, Some(Weekday::Fri)),
            d(2024, 3, 17)
        );
    }

    #[test]
    fn test_irregular_falls_back_to_monthly_arithmetic() {
        assert_eq!(
            predict_next_date(d(2024, 3, 15), Frequency::Irregular, None, None),
            d(2024, 4, 15)
        );
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }
}
