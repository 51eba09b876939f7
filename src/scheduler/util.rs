use chrono::{Datelike, NaiveDate, Weekday};

pub(crate) fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

pub(crate) fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub(crate) fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Format court `dd/MM` utilisé dans les messages.
pub(crate) fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m").to_string()
}
