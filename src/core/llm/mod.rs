//! Streaming LLM inference client.

pub mod replicate;
pub mod sse;

pub use replicate::{LlmError, ReplicateClient, Result};
pub use sse::{SseEvent, StreamParser};

use serde::Serialize;

/// Model served by the predictions API.
pub const MODEL_VERSION: &str =
    "df7690f1994d94e96ad9d568eac121aecf50684a0b0963b25a41cc40061269e5";

/// Generation parameters sent with every prediction.
///
/// Fixed for this application; `Default` carries the production values.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_length: u32,
    pub repetition_penalty: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_length: 2000,
            repetition_penalty: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let p = GenerationParams::default();
        assert_eq!(p.temperature, 0.1);
        assert_eq!(p.top_p, 0.9);
        assert_eq!(p.max_length, 2000);
        assert_eq!(p.repetition_penalty, 1.0);
    }
}
