//! Generation parameters and their admission bounds.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Milliseconds of audio covered by one decoder frame.
///
/// The engine reports checkpoint progress in frames; the frame total for a
/// job is derived from the requested audio length at this rate.
pub const MS_PER_FRAME: u64 = 80;

/// Sampling and length parameters for one generation request.
///
/// Bounds are enforced at the API edge via [`Validate`]; the scheduler
/// assumes any `GenerationParams` it receives has already passed them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct GenerationParams {
    /// Target audio length in milliseconds.
    #[validate(range(min = 10_000, max = 240_000))]
    pub max_audio_length_ms: u64,

    /// Sampling temperature.
    #[validate(range(min = 0.1, max = 2.0))]
    pub temperature: f32,

    /// Top-k sampling cutoff.
    #[validate(range(min = 1, max = 500))]
    pub topk: u32,

    /// Classifier-free guidance scale.
    #[validate(range(min = 1.0, max = 5.0))]
    pub cfg_scale: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_audio_length_ms: 120_000,
            temperature: 1.0,
            topk: 50,
            cfg_scale: 1.5,
        }
    }
}

impl GenerationParams {
    /// Total number of decoder frames the engine will produce for these
    /// parameters. Progress events count up to this value.
    pub fn total_frames(&self) -> u64 {
        self.max_audio_length_ms / MS_PER_FRAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_bounds() {
        let params = GenerationParams::default();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn total_frames_uses_frame_rate() {
        let params = GenerationParams {
            max_audio_length_ms: 120_000,
            ..Default::default()
        };
        assert_eq!(params.total_frames(), 1500);

        let short = GenerationParams {
            max_audio_length_ms: 8_000,
            ..Default::default()
        };
        assert_eq!(short.total_frames(), 100);
    }

    #[test]
    fn out_of_range_length_is_rejected() {
        let params = GenerationParams {
            max_audio_length_ms: 500_000,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
