//! Deterministic puzzle session module
//!
//! All verification logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, injected by the caller
//! - Explicit phase transitions, no timers
//! - No rendering or platform dependencies

pub mod geometry;
pub mod mask;
pub mod state;
pub mod verify;

pub use geometry::{PieceGeometry, place_notch};
pub use mask::{MASK_STYLE, MaskOp, PathCommand, outline_bounds, piece_outline};
pub use state::{DragFrame, SessionEvent, SessionPhase, SessionState};
pub use verify::{Verdict, verify};
