pub mod handlers;
pub mod routes;
pub mod validate;

use serde::Serialize;

pub const SUPPORTED_FORMAT: &str = "wav";

/// A synthesis request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<String>,
    pub default: String,
    pub supported_format: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub supported_format: &'static str,
}
