//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use lekha::engine::{RecordedPass, ReplayScript};
use lekha::{DocumentPipeline, LekhaConfig};

/// A complete, internally consistent licence as the `Standard` pass would read it.
pub const CARD: &str = "Government of Nepal\n\
    Department of Transport Management\n\
    D.L. No: 03-066-041605\n\
    B.G: A+\n\
    Name: RAM BAHADUR THAPA\n\
    Address: Ekantakuna, Lalitpur\n\
    D.O.B: 12-05-1990\n\
    F/H Name: HARI BAHADUR THAPA\n\
    Citizenship No: 27-01-75-12345\n\
    Phone No: 9841234567\n\
    Category: A, B\n\
    D.O.I: 15-01-2020   D.O.E: 14-01-2030";

/// `CARD` with the expiry date replaced.
pub fn card_with_expiry(expiry: &str) -> String {
    CARD.replace("D.O.E: 14-01-2030", &format!("D.O.E: {}", expiry))
}

/// `CARD` with both validity dates replaced.
pub fn card_with_dates(issue: &str, expiry: &str) -> String {
    CARD.replace("D.O.I: 15-01-2020   D.O.E: 14-01-2030", &format!("D.O.I: {}   D.O.E: {}", issue, expiry))
}

pub fn pass(text: &str, confidence: f64) -> RecordedPass {
    RecordedPass::from_text(text, confidence)
}

pub fn delayed(text: &str, confidence: f64, delay_ms: u64) -> RecordedPass {
    RecordedPass::from_text(text, confidence).with_delay(Duration::from_millis(delay_ms))
}

/// Script for the default `Standard` / `Precise` catalog.
pub fn script(standard: RecordedPass, precise: RecordedPass) -> ReplayScript {
    ReplayScript::new().with_pass("Standard", standard).with_pass("Precise", precise)
}

pub fn pipeline(script: ReplayScript) -> DocumentPipeline {
    pipeline_with(script, LekhaConfig::default())
}

pub fn pipeline_with(script: ReplayScript, config: LekhaConfig) -> DocumentPipeline {
    DocumentPipeline::from_config(Arc::new(script.into_factory()), &config).expect("pipeline should start")
}

pub fn image() -> Arc<[u8]> {
    Arc::from(&b"\x89PNG fixture bytes"[..])
}
