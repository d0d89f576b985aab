// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Negframe.
//
// Only conditions that abort a run live here. Degenerate detections, spurious
// skew and near-zero reference channels are recovered inside the pipeline and
// never surface as errors.

use thiserror::Error;

/// Top-level error type for all Negframe operations.
#[derive(Debug, Error)]
pub enum NegframeError {
    // -- Image I/O --
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    #[error("failed to encode image: {0}")]
    ImageEncode(String),

    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    // -- Configuration --
    #[error("invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },

    // -- Watch folder --
    #[error("watch folder error: {0}")]
    Watch(String),

    // -- Storage / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NegframeError {
    /// Build an `InvalidParameter` error from any displayable value.
    pub fn invalid(name: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NegframeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message_names_field() {
        let err = NegframeError::invalid("rebate.min_area_fraction", 1.5);
        assert_eq!(
            err.to_string(),
            "invalid parameter: rebate.min_area_fraction = 1.5"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: NegframeError = io.into();
        assert!(matches!(err, NegframeError::Io(_)));
    }
}
