//! Canonical forms survive a second trip through normalization and validation.

use lekha::extraction::dates::{format_iso, parse_date};
use lekha::extraction::license::{LicenseNumber, canonicalize};
use lekha::extraction::normalize::normalize;
use lekha::{ExtractedRecord, FieldName, ValidationLayer};

#[test]
fn test_license_number_canonical_form_is_stable() {
    for raw in ["03066041605", "03 066 041605", "03-066-041605"] {
        let canonical = canonicalize(raw).unwrap();
        assert_eq!(canonical, "03-066-041605", "from {raw}");
        assert_eq!(canonicalize(&canonical).as_deref(), Some(canonical.as_str()));

        let parsed = LicenseNumber::parse(&canonical).unwrap();
        assert_eq!(parsed.to_string(), canonical);
    }

    assert_eq!(normalize(FieldName::LicenseNumber, "०३-०६६-०४१६०५", 50), "03-066-041605");
}

#[test]
fn test_normalized_values_are_fixed_points() {
    let cases = [
        (FieldName::LicenseNumber, "03 066 041605"),
        (FieldName::ExpiryDate, "14/01/2030"),
        (FieldName::DateOfBirth, "12 May 1990"),
        (FieldName::PhoneNumber, "+977 984-1234567"),
        (FieldName::BloodGroup, "b +ve"),
        (FieldName::Category, "क, ख"),
        (FieldName::HolderName, "Sita Rai."),
        (FieldName::Address, "ललितपुर महानगरपालिका"),
    ];

    for (field, raw) in cases {
        let once = normalize(field, raw, 50);
        let twice = normalize(field, &once, 50);
        assert_eq!(once, twice, "{field} from {raw:?}");
    }
}

#[test]
fn test_two_digit_years_follow_the_pivot() {
    let date = parse_date("15-01-20", 50).unwrap();
    assert_eq!(format_iso(date), "2020-01-15");
    let date = parse_date("12-05-90", 50).unwrap();
    assert_eq!(format_iso(date), "1990-05-12");
}

#[test]
fn test_normalized_record_passes_validation() {
    let raw = [
        (FieldName::LicenseNumber, "03066041605"),
        (FieldName::HolderName, "Ram Bahadur Thapa"),
        (FieldName::IssueDate, "15-01-2020"),
        (FieldName::ExpiryDate, "14-01-2030"),
        (FieldName::PhoneNumber, "9779841234567"),
        (FieldName::BloodGroup, "0+"),
    ];
    let normalized: Vec<(FieldName, String)> =
        raw.iter().map(|(field, value)| (*field, normalize(*field, value, 50))).collect();
    let record = ExtractedRecord::from_values(normalized.iter().map(|(f, v)| (*f, v.as_str())));

    let summary = ValidationLayer::default().validate(&record);
    assert!(summary.is_valid(), "{:?}", summary.messages());
}

#[test]
fn test_unnormalized_record_gets_suggestions() {
    let record = ExtractedRecord::from_values([
        (FieldName::LicenseNumber, "03066041605"),
        (FieldName::HolderName, "RAM BAHADUR THAPA"),
        (FieldName::IssueDate, "2020/01/15"),
        (FieldName::ExpiryDate, "2030-01-14"),
        (FieldName::PhoneNumber, "9779841234567"),
        (FieldName::BloodGroup, "0+"),
    ]);

    let summary = ValidationLayer::default().validate(&record);
    assert!(!summary.is_valid());

    let suggestion = |field| summary.field(field).unwrap().suggestions.clone();
    assert_eq!(suggestion(FieldName::LicenseNumber), vec!["03-066-041605"]);
    assert_eq!(suggestion(FieldName::IssueDate), vec!["2020-01-15"]);
    assert_eq!(suggestion(FieldName::PhoneNumber), vec!["9841234567"]);
    assert_eq!(suggestion(FieldName::BloodGroup), vec!["O+"]);
}
