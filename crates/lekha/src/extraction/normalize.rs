//! Canonical forms applied after voting.

use super::candidates::mobile_digits;
use super::dates::{format_iso, parse_date};
use super::license::canonicalize;
use super::patterns::{BLOOD_GROUP_VALUE, collapse_whitespace};
use super::record::FieldName;
use super::terms::{category_letter, latinize_blood_group, translate_to_english, transliterate_digits};

/// Canonical form of a voted value. Values that do not fit the field's shape are returned
/// whitespace-collapsed so validation can report on them.
pub fn normalize(field: FieldName, raw: &str, pivot: u32) -> String {
    let text = transliterate_digits(raw);
    let collapsed = collapse_whitespace(&text);

    let normalized = match field {
        FieldName::LicenseNumber => canonicalize(&collapsed),
        FieldName::IssueDate | FieldName::ExpiryDate | FieldName::DateOfBirth => {
            parse_date(&collapsed, pivot).map(format_iso)
        }
        FieldName::PhoneNumber => mobile_digits(&collapsed),
        FieldName::BloodGroup => blood_group(&collapsed),
        FieldName::Category => category(&collapsed),
        FieldName::HolderName | FieldName::GuardianName => Some(name(&collapsed)),
        FieldName::Address | FieldName::IssuingAuthority => Some(translate_to_english(&collapsed)),
        FieldName::CitizenshipNumber => Some(collapsed.chars().filter(|c| !c.is_whitespace()).collect()),
    };

    normalized.unwrap_or(collapsed)
}

fn name(text: &str) -> String {
    text.trim_end_matches(['.', ',', ';', ':'])
        .to_uppercase()
}

/// `A+`..`O-`. `0` is read as `O`; `pos`/`neg`, `+ve`/`-ve` and `(+)` become signs.
fn blood_group(text: &str) -> Option<String> {
    let latin = latinize_blood_group(text);
    let caps = BLOOD_GROUP_VALUE.captures(&latin)?;
    let letters = caps[1].to_uppercase().replace('0', "O");
    let sign_text = caps[2].to_lowercase();
    let sign = if sign_text.contains('+') || sign_text.starts_with("pos") || sign_text.contains("पो") {
        '+'
    } else {
        '-'
    };
    Some(format!("{}{}", letters, sign))
}

/// Comma-separated upper-case letters, Devanagari category letters mapped to Latin.
/// Order of first appearance is kept and duplicates dropped.
fn category(text: &str) -> Option<String> {
    let mut letters: Vec<String> = Vec::new();
    for part in text.split(|c: char| c.is_whitespace() || matches!(c, ',' | '/' | ';' | '&')) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let mut chars = part.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) => category_letter(c).unwrap_or(c).to_uppercase().collect::<String>(),
            _ => part.to_uppercase(),
        };
        if !letters.contains(&letter) {
            letters.push(letter);
        }
    }
    (!letters.is_empty()).then(|| letters.join(","))
}
