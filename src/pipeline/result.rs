//! Response records returned by the pipelines.
//!
//! Both serialise to the wire shape consumed by clients; `error` is omitted
//! when absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::classification::Classification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewResult {
    pub summary: String,
    pub highlights: Vec<String>,
    pub lowlights: Vec<String>,
    pub key_named_entities: BTreeMap<String, String>,
    pub model: String,
    /// Seconds, rounded to milliseconds.
    pub processing_time: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub product_name: String,
    pub feedback: String,
    pub classification: Classification,
    pub response: String,
    pub model: String,
    pub processing_time: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
