//! Calendar anchor detection
//!
//! A pattern can be anchored to a day of the month ("the 15th") or, for
//! weekly-scale cadences, to a weekday ("every Friday"). Anchors feed
//! prediction: a typical day of month overrides simple date arithmetic for
//! monthly-scale cadences, and a typical weekday nudges weekly predictions.

use chrono::{Datelike, NaiveDate, Weekday};

/// Minimum share of dates that must agree on a day of month
pub const DAY_OF_MONTH_THRESHOLD: f64 = 0.60;

/// Minimum share of dates that must fall on the same weekday
pub const WEEKDAY_THRESHOLD: f64 = 0.70;

/// Days either side of the modal day counted as agreeing with it
pub const DAY_OF_MONTH_CLUSTER_TOLERANCE: i64 = 2;

/// Detect a typical day of month with the default threshold.
pub fn detect_typical_day_of_month(dates: &[NaiveDate]) -> Option<u32> {
    detect_typical_day_of_month_with(dates, DAY_OF_MONTH_THRESHOLD)
}

/// Detect a typical day of month.
///
/// Two passes over the modal day: first an exact-match count, then a
/// clustered count that treats days within `DAY_OF_MONTH_CLUSTER_TOLERANCE`
/// as agreeing. Distance wraps at 30 so the 1st and the 29th of short
/// months cluster with month-end anchors. Needs at least three dates.
pub fn detect_typical_day_of_month_with(dates: &[NaiveDate], threshold: f64) -> Option<u32> {
    if dates.len() < 3 {
        return None;
    }

    let mut counts = [0usize; 32];
    for date in dates {
        counts[date.day() as usize] += 1;
    }
    let modal_day = (1..=31).max_by_key(|&d| counts[d as usize])? as u32;

    let total = dates.len() as f64;
    if counts[modal_day as usize] as f64 / total >= threshold {
        return Some(modal_day);
    }

    let clustered = dates
        .iter()
        .filter(|d| day_distance(d.day(), modal_day) <= DAY_OF_MONTH_CLUSTER_TOLERANCE)
        .count();
    if clustered as f64 / total >= threshold {
        return Some(modal_day);
    }
    None
}

/// Circular distance between two days of month, wrapping at 30 so that
/// e.g. the 29th and the 1st are two days apart.
fn day_distance(a: u32, b: u32) -> i64 {
    let direct = (a as i64 - b as i64).abs();
    direct.min(30 - direct)
}

/// Detect a typical weekday with the default threshold.
pub fn detect_typical_weekday(dates: &[NaiveDate]) -> Option<Weekday> {
    detect_typical_weekday_with(dates, WEEKDAY_THRESHOLD)
}

/// Detect a typical weekday: the modal weekday, accepted only when it
/// holds at least `threshold` of the dates. Exact matches only, no
/// clustering. Needs at least three dates.
pub fn detect_typical_weekday_with(dates: &[NaiveDate], threshold: f64) -> Option<Weekday> {
    if dates.len() < 3 {
        return None;
    }

    let mut counts = [0usize; 7];
    for date in dates {
        counts[date.weekday().num_days_from_sunday() as usize] += 1;
    }
    let (modal, count) = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, c)| *c)
        .map(|(i, c)| (i, *c))?;

    if count as f64 / dates.len() as f64 >= threshold {
        weekday_from_sunday_index(modal as u32)
    } else {
        None
    }
}

fn weekday_from_sunday_index(index: u32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}
