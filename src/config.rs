//! Widget configuration and setup validation
//!
//! Dimension checks run once at mount time; an undersized canvas is a
//! misconfiguration, not a recoverable runtime error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::session::geometry::PieceGeometry;

/// Fatal configuration errors caught before the first puzzle is drawn
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("canvas width {width} too small: piece span {span} needs width > {min_width}")]
    CanvasTooNarrow { width: u32, span: f64, min_width: f64 },
    #[error("canvas height {height} too small: piece span {span} needs height > {min_height}")]
    CanvasTooShort {
        height: u32,
        span: f64,
        min_height: f64,
    },
}

/// Widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Background canvas width in pixels
    pub width: u32,
    /// Background canvas height in pixels
    pub height: u32,
    /// Side length of the square piece body
    pub piece_len: f64,
    /// Radius of the piece's tab bumps
    pub corner_radius: f64,
    /// Image fetch retries before giving up
    pub retry_limit: u32,
    /// Delay before a failed attempt auto-resets
    pub fail_reset_delay_ms: u32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            piece_len: PIECE_LEN,
            corner_radius: CORNER_RADIUS,
            retry_limit: 1,
            fail_reset_delay_ms: FAIL_RESET_DELAY_MS,
        }
    }
}

impl WidgetConfig {
    /// Piece geometry derived from this configuration
    pub fn geometry(&self) -> PieceGeometry {
        PieceGeometry::new(self.piece_len, self.corner_radius)
    }

    /// Check that the canvas can hold the piece plus placement margins.
    ///
    /// The notch x range is `[span+margin, width-(span+margin)]` and the y
    /// range is `[margin+2r, height-(span+margin)]`; both must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let span = self.geometry().span();
        let min_width = 2.0 * (span + PLACEMENT_MARGIN);
        if (self.width as f64) <= min_width {
            return Err(ConfigError::CanvasTooNarrow {
                width: self.width,
                span,
                min_width,
            });
        }
        let min_height = (span + PLACEMENT_MARGIN) + (PLACEMENT_MARGIN + 2.0 * self.corner_radius);
        if (self.height as f64) <= min_height {
            return Err(ConfigError::CanvasTooShort {
                height: self.height,
                span,
                min_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(WidgetConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_narrow_canvas_rejected() {
        let config = WidgetConfig {
            width: 146,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CanvasTooNarrow { .. })
        ));
    }

    #[test]
    fn test_short_canvas_rejected() {
        let config = WidgetConfig {
            height: 101,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CanvasTooShort { .. })
        ));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = WidgetConfig {
            width: 400,
            retry_limit: 2,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: WidgetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.width, 400);
        assert_eq!(back.retry_limit, 2);
        assert_eq!(back.height, config.height);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WidgetConfig = serde_json::from_str(r#"{"width": 372}"#).unwrap();
        assert_eq!(config.width, 372);
        assert_eq!(config.height, DEFAULT_HEIGHT);
    }
}
