//! Multi-format date recognition.
//!
//! Accepted shapes, tried in this order:
//!
//! | Shape                         | Example        |
//! |-------------------------------|----------------|
//! | `YYYY-MM-DD`, `YYYY/MM/DD`    | `2030/01/15`   |
//! | `DD-MM-YYYY`, `/`, `.`        | `15.01.2030`   |
//! | `DD-MM-YY`                    | `15-01-30`     |
//! | `DD Mon YYYY`, `DD-MON-YYYY`  | `15 Jan 2030`  |
//!
//! Two-digit years at or below the pivot become `20yy`, the rest `19yy`.

use chrono::NaiveDate;

use super::patterns::{DMY_DATE, ISO_DATE, NAMED_MONTH_DATE};

/// A date found in text, with the exact substring that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub raw: String,
    pub date: NaiveDate,
    pub start: usize,
}

pub fn expand_year(year: u32, digits: usize, pivot: u32) -> i32 {
    if digits == 2 {
        if year <= pivot { 2000 + year as i32 } else { 1900 + year as i32 }
    } else {
        year as i32
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// First valid date in `text`. Out-of-range day/month combinations are skipped.
pub fn find_date(text: &str, pivot: u32) -> Option<DateMatch> {
    let mut found: Vec<DateMatch> = Vec::new();

    for caps in ISO_DATE.captures_iter(text) {
        let (Ok(y), Ok(m), Ok(d)) = (caps[1].parse::<i32>(), caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            push_match(&mut found, &caps, date);
        }
    }

    for caps in DMY_DATE.captures_iter(text) {
        let (Ok(d), Ok(m), Ok(y)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
            continue;
        };
        let year = expand_year(y, caps[3].len(), pivot);
        if let Some(date) = NaiveDate::from_ymd_opt(year, m, d) {
            push_match(&mut found, &caps, date);
        }
    }

    for caps in NAMED_MONTH_DATE.captures_iter(text) {
        let (Ok(d), Some(m), Ok(y)) = (caps[1].parse::<u32>(), month_number(&caps[2]), caps[3].parse::<u32>()) else {
            continue;
        };
        let year = expand_year(y, caps[3].len(), pivot);
        if let Some(date) = NaiveDate::from_ymd_opt(year, m, d) {
            push_match(&mut found, &caps, date);
        }
    }

    found.into_iter().min_by_key(|m| m.start)
}

fn push_match(found: &mut Vec<DateMatch>, caps: &regex::Captures<'_>, date: NaiveDate) {
    if let Some(whole) = caps.get(0) {
        found.push(DateMatch {
            raw: whole.as_str().to_string(),
            date,
            start: whole.start(),
        });
    }
}

/// Parses a whole value as a date in any accepted shape.
pub fn parse_date(text: &str, pivot: u32) -> Option<NaiveDate> {
    find_date(text.trim(), pivot).map(|m| m.date)
}

/// Strict ISO (`YYYY-MM-DD`) parse, as stored in records.
pub fn parse_iso(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
