//! Terminal results of the camera scan subsystem and the insert-form pre-fill
//! derived from them.

use chrono::NaiveDate;
use serde::Serialize;

/// What a completed scan produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    /// Raw value of a decoded barcode.
    Barcode(String),
    /// Text recognised on a photographed label.
    RecognisedText(String),
}

/// Final state of one scan attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(ScanPayload),
    /// The user backed out.
    Cancelled,
    /// The scanner reported an error.
    Failed { reason: String },
}

/// Suggested values for the insert form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPrefill {
    /// Barcode the values came from, if any.
    pub code: Option<String>,
    /// Suggested product name; empty when unknown.
    pub name: String,
    /// Image to show next to the form.
    pub image_url: Option<String>,
    /// Suggested expiry date.
    pub expiry_date: Option<NaiveDate>,
}
