//! Per-pass candidate generation.
//!
//! Every matcher reads a derived copy of the pass text (Devanagari digits transliterated)
//! split into trimmed lines. A label-anchored match is preferred over an unlabeled
//! fallback, and at most one candidate per field is produced per pass.

use regex::Regex;

use super::dates::find_date;
use super::patterns::*;
use super::record::{FieldCandidate, FieldName};
use super::terms::{category_letter, latinize_blood_group, transliterate_digits};
use crate::types::{RawPassResult, Token};

/// Quality factor for a value found next to its label.
pub const ANCHORED_QUALITY: f64 = 1.0;
/// Quality factor for a value found by shape alone.
pub const FALLBACK_QUALITY: f64 = 0.85;

#[derive(Debug, Clone, PartialEq)]
struct RawMatch {
    value: String,
    anchored: bool,
}

impl RawMatch {
    fn anchored(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            anchored: true,
        }
    }

    fn fallback(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            anchored: false,
        }
    }
}

/// All candidates one pass yields, in [`FieldName::ALL`] order.
pub fn candidates_for_pass(pass: &RawPassResult, pivot: u32) -> Vec<FieldCandidate> {
    let derived = transliterate_digits(&pass.text);
    let lines: Vec<&str> = derived.lines().map(str::trim).collect();

    FieldName::ALL
        .iter()
        .filter_map(|field| {
            let found = match_field(*field, &lines, pivot)?;
            let quality = if found.anchored { ANCHORED_QUALITY } else { FALLBACK_QUALITY };
            Some(FieldCandidate {
                field: *field,
                confidence: score(pass, &found.value, quality),
                value: found.value,
                source_pass: pass.config_name.clone(),
                catalog_index: pass.catalog_index,
            })
        })
        .collect()
}

fn match_field(field: FieldName, lines: &[&str], pivot: u32) -> Option<RawMatch> {
    match field {
        FieldName::LicenseNumber => license_number(lines),
        FieldName::HolderName => name_line(lines, &HOLDER_NAME_LINE),
        FieldName::GuardianName => name_line(lines, &GUARDIAN_NAME_LINE),
        FieldName::IssueDate => labeled_date(lines, &ISSUE_DATE_LABEL, pivot),
        FieldName::ExpiryDate => labeled_date(lines, &EXPIRY_DATE_LABEL, pivot),
        FieldName::DateOfBirth => labeled_date(lines, &BIRTH_DATE_LABEL, pivot),
        FieldName::Address => address(lines),
        FieldName::IssuingAuthority => issuing_authority(lines),
        FieldName::CitizenshipNumber => citizenship_number(lines),
        FieldName::PhoneNumber => phone_number(lines),
        FieldName::BloodGroup => blood_group(lines),
        FieldName::Category => category(lines),
    }
}

/// Mean confidence of supporting tokens (or the pass's overall confidence), capped at
/// the pass's overall confidence, scaled to 0..1 and weighted by `quality`.
fn score(pass: &RawPassResult, value: &str, quality: f64) -> f64 {
    let key = support_key(value);
    let supporting: Vec<f64> = pass
        .tokens
        .iter()
        .filter(|t| supports(&key, t))
        .map(|t| t.confidence)
        .collect();

    let base = if supporting.is_empty() {
        pass.overall_confidence
    } else {
        supporting.iter().sum::<f64>() / supporting.len() as f64
    };

    (base.min(pass.overall_confidence).clamp(0.0, 100.0) / 100.0) * quality
}

fn support_key(text: &str) -> String {
    transliterate_digits(text)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

fn supports(value_key: &str, token: &Token) -> bool {
    let token_key = support_key(&token.text);
    if token_key.is_empty() {
        return false;
    }
    token_key == value_key || (token_key.chars().count() >= 2 && value_key.contains(&token_key))
}

/// Inline labels that end the value of a preceding label on the same line.
fn inline_labels() -> [&'static Regex; 7] {
    [
        &*LICENSE_LABEL,
        &*ISSUE_DATE_LABEL,
        &*EXPIRY_DATE_LABEL,
        &*BIRTH_DATE_LABEL,
        &*BLOOD_GROUP_LABEL,
        &*PHONE_LABEL,
        &*CITIZENSHIP_LINE,
    ]
}

/// `text` up to the first inline label.
fn cut_at_next_label(text: &str) -> &str {
    let end = inline_labels()
        .iter()
        .filter_map(|re| re.find(text).map(|m| m.start()))
        .min()
        .unwrap_or(text.len());
    &text[..end]
}

fn clean_value(text: &str) -> String {
    collapse_whitespace(text.trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | ',' | ';' | '-' | '.' | '।')))
}

fn next_non_empty<'a>(lines: &[&'a str], after: usize) -> Option<&'a str> {
    lines.iter().skip(after + 1).find(|l| !l.is_empty()).copied()
}

fn license_number(lines: &[&str]) -> Option<RawMatch> {
    for (i, line) in lines.iter().enumerate() {
        if let Some(label) = LICENSE_LABEL.find(line) {
            let rest = &line[label.end()..];
            if let Some(m) = LICENSE_NUMBER.find(rest) {
                return Some(RawMatch::anchored(m.as_str()));
            }
            if rest.trim().is_empty()
                && let Some(next) = next_non_empty(lines, i)
                && let Some(m) = LICENSE_NUMBER.find(next)
            {
                return Some(RawMatch::anchored(m.as_str()));
            }
        }
    }

    lines
        .iter()
        .find_map(|line| LICENSE_NUMBER.find(line))
        .map(|m| RawMatch::fallback(m.as_str()))
}

fn is_date_label_line(line: &str) -> bool {
    [&*ISSUE_DATE_LABEL, &*EXPIRY_DATE_LABEL, &*BIRTH_DATE_LABEL]
        .iter()
        .any(|re| re.is_match(line))
}

/// Date following `label`, either in the same segment of the line or, when the label
/// ends the line, on the next unlabeled line.
fn labeled_date(lines: &[&str], label: &Regex, pivot: u32) -> Option<RawMatch> {
    for (i, line) in lines.iter().enumerate() {
        for m in label.find_iter(line) {
            let after = &line[m.end()..];
            let segment = cut_at_next_label(after);
            if let Some(date) = find_date(segment, pivot) {
                return Some(RawMatch::anchored(date.raw));
            }
            if after.trim().is_empty()
                && let Some(next) = next_non_empty(lines, i)
                && !is_date_label_line(next)
                && let Some(date) = find_date(next, pivot)
            {
                return Some(RawMatch::anchored(date.raw));
            }
        }
    }
    None
}

fn name_line(lines: &[&str], pattern: &Regex) -> Option<RawMatch> {
    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let rest = caps.get(1).map_or("", |m| m.as_str());
        let mut value = clean_value(cut_at_next_label(rest));
        if value.is_empty()
            && let Some(next) = next_non_empty(lines, i)
            && !next.contains(':')
        {
            value = clean_value(cut_at_next_label(next));
        }
        if is_plausible_name(&value) {
            return Some(RawMatch::anchored(value));
        }
    }
    None
}

fn is_plausible_name(value: &str) -> bool {
    value.chars().any(char::is_alphabetic) && !value.chars().any(|c| c.is_ascii_digit())
}

fn address(lines: &[&str]) -> Option<RawMatch> {
    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = ADDRESS_LINE.captures(line) else {
            continue;
        };
        let rest = caps.get(1).map_or("", |m| m.as_str());
        let value = clean_value(cut_at_next_label(rest));
        if !value.is_empty() {
            return Some(RawMatch::anchored(value));
        }
        if let Some(next) = next_non_empty(lines, i) {
            let value = clean_value(cut_at_next_label(next));
            if !value.is_empty() {
                return Some(RawMatch::anchored(value));
            }
        }
    }
    None
}

fn issuing_authority(lines: &[&str]) -> Option<RawMatch> {
    for line in lines {
        if let Some(caps) = AUTHORITY_LINE.captures(line) {
            let value = clean_value(cut_at_next_label(caps.get(1).map_or("", |m| m.as_str())));
            if !value.is_empty() {
                return Some(RawMatch::anchored(value));
            }
        }
    }

    lines
        .iter()
        .find(|line| TRANSPORT_OFFICE.is_match(line))
        .map(|line| RawMatch::fallback(clean_value(cut_at_next_label(line))))
        .filter(|m| !m.value.is_empty())
}

fn citizenship_number(lines: &[&str]) -> Option<RawMatch> {
    lines.iter().find_map(|line| {
        let caps = CITIZENSHIP_LINE.captures(line)?;
        let value = clean_value(caps.get(1)?.as_str());
        (!value.is_empty()).then(|| RawMatch::anchored(value))
    })
}

/// 10-digit mobile number from `run`, accepting a `977` country prefix.
pub(crate) fn mobile_digits(run: &str) -> Option<String> {
    let digits: String = run.chars().filter(char::is_ascii_digit).collect();
    let local = match digits.len() {
        10 => digits.as_str(),
        13 if digits.starts_with("977") => &digits[3..],
        _ => return None,
    };
    MOBILE_NUMBER.is_match(local).then(|| local.to_string())
}

/// The mobile number inside a greedy digit run. Tries the whole run first, then
/// whitespace-separated groups from the left, so `9841234567 12` yields its first ten digits.
fn mobile_in_run(run: &str) -> Option<&str> {
    if mobile_digits(run).is_some() {
        return Some(run.trim());
    }
    let spans = word_spans(run);
    (0..spans.len()).find_map(|first| {
        (first..spans.len())
            .map(|last| &run[spans[first].0..spans[last].1])
            .find(|candidate| mobile_digits(candidate).is_some())
    })
}

fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

fn phone_number(lines: &[&str]) -> Option<RawMatch> {
    for line in lines {
        if let Some(label) = PHONE_LABEL.find(line)
            && let Some(value) = PHONE_RUN
                .find_iter(&line[label.end()..])
                .find_map(|m| mobile_in_run(m.as_str()))
        {
            return Some(RawMatch::anchored(value));
        }
    }

    lines.iter().find_map(|line| {
        PHONE_RUN
            .find_iter(line)
            .find_map(|m| mobile_in_run(m.as_str()))
            .map(RawMatch::fallback)
    })
}

/// Blood group in `text`, rejecting matches glued to a following letter or digit
/// (`B-2` is a block number, not a blood group).
fn find_blood_group(text: &str) -> Option<String> {
    let latin = latinize_blood_group(text);
    BLOOD_GROUP_VALUE
        .find_iter(&latin)
        .find(|m| {
            latin[m.end()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric())
        })
        .map(|m| collapse_whitespace(m.as_str()))
}

fn blood_group(lines: &[&str]) -> Option<RawMatch> {
    for line in lines {
        if let Some(label) = BLOOD_GROUP_LABEL.find(line)
            && let Some(value) = find_blood_group(&line[label.end()..])
        {
            return Some(RawMatch::anchored(value));
        }
    }
    lines
        .iter()
        .find_map(|line| find_blood_group(line))
        .map(RawMatch::fallback)
}

fn category(lines: &[&str]) -> Option<RawMatch> {
    lines.iter().find_map(|line| {
        let caps = CATEGORY_LINE.captures(line)?;
        let value = clean_value(cut_at_next_label(caps.get(1)?.as_str()));
        let has_letter = value
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | '/' | ';' | '&'))
            .any(|part| {
                let mut chars = part.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c.is_ascii_alphabetic() || category_letter(c).is_some(),
                    _ => false,
                }
            });
        has_letter.then(|| RawMatch::anchored(value))
    })
}
