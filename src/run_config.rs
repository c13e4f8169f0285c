//! `RunConfig` and `ContextCacheConfig` (spec.md §6), (de)serializable so
//! embedders can load them from TOML or another config format — parsing a
//! whole agent *tree* stays out of scope, only these two leaf structs are.

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamingMode {
    None,
    Sse,
    Bidi,
}

impl Default for StreamingMode {
    fn default() -> Self {
        StreamingMode::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Positive integer; `0` is explicitly rejected by `validate` — see the
    /// open question in spec.md §9 on the source's inconsistent treatment
    /// of `0`.
    pub max_llm_calls: u32,
    pub streaming_mode: StreamingMode,
    pub response_modalities: Vec<String>,
    pub output_audio_transcription: bool,
    pub support_cfc: bool,
    pub transfer_max_depth: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            max_llm_calls: 20,
            streaming_mode: StreamingMode::default(),
            response_modalities: Vec::new(),
            output_audio_transcription: false,
            support_cfc: false,
            transfer_max_depth: 5,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_llm_calls == 0 {
            return Err(AgentError::Validation(
                "max_llm_calls must be positive; 0 is not treated as unbounded".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextCacheConfig {
    pub cache_intervals: u32,
    pub ttl_seconds: u64,
    pub min_tokens: u64,
}

impl Default for ContextCacheConfig {
    fn default() -> Self {
        ContextCacheConfig { cache_intervals: 10, ttl_seconds: 1800, min_tokens: 0 }
    }
}

impl ContextCacheConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.cache_intervals) {
            return Err(AgentError::Validation(
                "cache_intervals must be in [1, 100]".to_string(),
            ));
        }
        if self.ttl_seconds == 0 {
            return Err(AgentError::Validation("ttl_seconds must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_max_llm_calls() {
        let cfg = RunConfig { max_llm_calls: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
        assert!(ContextCacheConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_cache_intervals() {
        let cfg = ContextCacheConfig { cache_intervals: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = ContextCacheConfig { cache_intervals: 101, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
