//! Format and range rules, one function per field plus the cross-field checks.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::report::ValidationReport;
use crate::core::config::ValidationSettings;
use crate::extraction::candidates::mobile_digits;
use crate::extraction::dates::{format_iso, parse_iso};
use crate::extraction::license::regroup_digits;
use crate::extraction::patterns::MOBILE_NUMBER;
use crate::extraction::terms::category_letter;

static CANONICAL_LICENSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})-(\d{3})-(\d{6})$").expect("Canonical license regex pattern is valid and should compile")
});

pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Provinces are numbered 1 through 7.
pub const PROVINCE_CODES: std::ops::RangeInclusive<u8> = 1..=7;

pub const MAX_HOLDER_AGE: u32 = 100;

/// Citizenship certificate numbers outside this digit count are unusual.
pub const CITIZENSHIP_DIGITS: std::ops::RangeInclusive<usize> = 5..=14;

pub fn license_number(value: &str, report: &mut ValidationReport) {
    let Some(caps) = CANONICAL_LICENSE.captures(value) else {
        report.error("invalid license number format, expected NN-NNN-NNNNNN");
        if let Some(regrouped) = regroup_digits(value) {
            report.suggest(regrouped);
        }
        return;
    };

    let province: u8 = caps[1].parse().unwrap_or(0);
    if !PROVINCE_CODES.contains(&province) {
        report.error(format!("province code {} outside 01-07", &caps[1]));
    }
    if &caps[2] == "000" {
        report.error("office code cannot be 000");
    }
}

pub fn person_name(value: &str, report: &mut ValidationReport) {
    if value.chars().any(|c| c.is_ascii_digit()) {
        report.error("name contains digits");
    }
    if !value.chars().any(char::is_alphabetic) {
        report.error("name has no letters");
    }
    if value.split_whitespace().count() == 1 {
        report.warning("name has a single word");
    }
}

/// Parses an ISO date, reporting a format error (and a suggestion for `/` separators)
/// when it is not one.
pub fn iso_date(value: &str, report: &mut ValidationReport) -> Option<NaiveDate> {
    if let Some(date) = parse_iso(value) {
        return Some(date);
    }

    report.error("invalid date format, expected YYYY-MM-DD");
    if value.contains('/')
        && let Some(date) = parse_iso(&value.replace('/', "-"))
    {
        report.suggest(format_iso(date));
    }
    None
}

pub fn blood_group(value: &str, report: &mut ValidationReport) {
    if BLOOD_GROUPS.contains(&value) {
        return;
    }
    report.error(format!("invalid blood group '{}'", value));

    let repaired = value.to_uppercase().replace('0', "O").replace(' ', "");
    if BLOOD_GROUPS.contains(&repaired.as_str()) {
        report.suggest(repaired);
    }
}

pub fn category(value: &str, report: &mut ValidationReport) {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.iter().all(|p| p.is_empty()) {
        report.error("category is empty");
        return;
    }

    for part in parts {
        let mut chars = part.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if ('A'..='K').contains(&c) => {}
            (Some(c), None) if category_letter(c).is_some() => {
                report.error(format!("category '{}' is not in Latin form", part));
                if let Some(latin) = category_letter(c) {
                    report.suggest(latin.to_string());
                }
            }
            _ => report.error(format!("category '{}' outside A-K", part)),
        }
    }
}

pub fn phone_number(value: &str, report: &mut ValidationReport) {
    if MOBILE_NUMBER.is_match(value) {
        return;
    }
    report.error("invalid mobile number, expected 10 digits starting with 96, 97 or 98");
    if let Some(local) = mobile_digits(value) {
        report.suggest(local);
    }
}

pub fn citizenship_number(value: &str, report: &mut ValidationReport) {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if digits == 0 {
        report.error("citizenship number has no digits");
    } else if !CITIZENSHIP_DIGITS.contains(&digits) {
        report.warning(format!("citizenship number has an unusual length ({} digits)", digits));
    }
}

/// Issue/expiry ordering and validity span.
pub fn validity_period(issue: NaiveDate, expiry: NaiveDate, settings: &ValidationSettings, report: &mut ValidationReport) {
    if expiry <= issue {
        report.error("expiry before issue");
        return;
    }

    // Expiry is the last valid day, so count through the day after it.
    let span = expiry
        .succ_opt()
        .and_then(|end| end.years_since(issue))
        .unwrap_or(0);
    if span < settings.min_validity_years || span > settings.max_validity_years {
        report.warning(format!(
            "validity span of {} years outside {}-{}",
            span, settings.min_validity_years, settings.max_validity_years
        ));
    }
}

/// Birth date against issue date.
pub fn holder_age(birth: NaiveDate, issue: NaiveDate, settings: &ValidationSettings, report: &mut ValidationReport) {
    if birth >= issue {
        report.error("date of birth on or after issue date");
        return;
    }

    let age = issue.years_since(birth).unwrap_or(0);
    if age < settings.min_holder_age {
        report.warning(format!("holder was {} at issue, below {}", age, settings.min_holder_age));
    } else if age > MAX_HOLDER_AGE {
        report.warning(format!("holder was {} at issue, above {}", age, MAX_HOLDER_AGE));
    }
}
