// src/app/utils.rs
use chrono::{Datelike, NaiveDate};

/// Year of a TMDB `YYYY-MM-DD` date. Partial dates still yield the year.
pub(crate) fn release_year(date: Option<&str>) -> Option<i32> {
    let s = date?.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.year());
    }
    s.get(..4)
        .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|y| y.parse().ok())
}

/// `170` → `"2h 50m"`.
pub(crate) fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// One decimal place, as shown on cards and the detail header.
pub(crate) fn format_rating(vote_average: f32) -> String {
    format!("{:.1}", vote_average)
}
