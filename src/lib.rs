//! Slide Captcha - A drag-to-slide jigsaw puzzle verification widget
//!
//! Core modules:
//! - `session`: Deterministic puzzle session (geometry, mask path, state machine, verifier)
//! - `config`: Widget configuration and setup validation
//! - `provider`: Pluggable background-image sourcing
//! - `widget`: Browser shell (canvas rendering, input listeners, timers)

pub mod config;
pub mod provider;
pub mod session;
#[cfg(target_arch = "wasm32")]
pub mod widget;

pub use config::{ConfigError, WidgetConfig};
pub use session::{SessionEvent, SessionPhase, SessionState, Verdict};

/// Widget tuning constants
pub mod consts {
    /// Default canvas width in pixels
    pub const DEFAULT_WIDTH: u32 = 310;
    /// Default canvas height in pixels
    pub const DEFAULT_HEIGHT: u32 = 155;

    /// Side length of the square piece body
    pub const PIECE_LEN: f64 = 42.0;
    /// Radius of the convex tab bumps (the concave notch uses this + 0.4)
    pub const CORNER_RADIUS: f64 = 9.0;
    /// Extra pad folded into the piece bounding span (stroke + concave bulge)
    pub const SPAN_PADDING: f64 = 3.0;
    /// Margin kept between the piece span and the canvas edges when placing
    pub const PLACEMENT_MARGIN: f64 = 10.0;

    /// A drag stops this many pixels short of the right canvas edge
    pub const EDGE_STOP: f64 = 38.0;
    /// Width of the slider knob the drag distance is scaled against
    pub const KNOB_WIDTH: f64 = 40.0;
    /// Extra travel margin removed from the piece's range
    pub const KNOB_MARGIN: f64 = 20.0;

    /// Horizontal alignment tolerance in pixels
    pub const SPLICE_TOLERANCE: f64 = 3.0;
    /// Delay before a failed attempt auto-resets
    pub const FAIL_RESET_DELAY_MS: u32 = 1500;

    /// Highest photo id accepted by the default image service
    pub const PICSUM_MAX_ID: u32 = 1084;
}

/// Arithmetic mean; 0 for an empty slice
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for an empty slice
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Slider-to-piece travel scale: maps knob travel onto the piece's usable range
#[inline]
pub fn travel_scale(width: f64) -> f64 {
    (width - consts::KNOB_WIDTH - consts::KNOB_MARGIN) / (width - consts::KNOB_WIDTH)
}
