//! Notch placement geometry
//!
//! The piece body is a square of side `piece_len` with a convex tab on the
//! top and right edges and a concave notch on the left edge. Its bounding
//! span is `piece_len + 2 * corner_radius + pad`, and the notch anchor must
//! be placed so the whole span (plus margins) stays inside the canvas.

use glam::DVec2;
use rand::Rng;

use crate::consts::{PLACEMENT_MARGIN, SPAN_PADDING};

/// Parametric piece shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceGeometry {
    /// Side length of the square piece body
    pub piece_len: f64,
    /// Radius of the convex tab bumps
    pub corner_radius: f64,
}

impl Default for PieceGeometry {
    fn default() -> Self {
        Self {
            piece_len: crate::consts::PIECE_LEN,
            corner_radius: crate::consts::CORNER_RADIUS,
        }
    }
}

impl PieceGeometry {
    pub fn new(piece_len: f64, corner_radius: f64) -> Self {
        Self {
            piece_len,
            corner_radius,
        }
    }

    /// Full bounding span of the piece, tabs and stroke pad included
    #[inline]
    pub fn span(&self) -> f64 {
        self.piece_len + 2.0 * self.corner_radius + SPAN_PADDING
    }

    /// Top-left corner of the square pixel rect that covers the whole piece
    /// for a notch anchored at `notch`. The rect is `span × span`.
    pub fn extract_origin(&self, notch: DVec2) -> DVec2 {
        DVec2::new(notch.x - 3.0, notch.y - 2.0 * self.corner_radius - 1.0)
    }
}

/// Pick a uniform notch anchor keeping the full piece span inside the canvas.
///
/// Caller must have validated the canvas dimensions ([`crate::WidgetConfig::validate`]);
/// both sampling ranges are non-empty for any validated configuration.
pub fn place_notch(rng: &mut impl Rng, width: f64, height: f64, geom: &PieceGeometry) -> DVec2 {
    let span = geom.span();
    let x = rng
        .random_range(span + PLACEMENT_MARGIN..=width - (span + PLACEMENT_MARGIN))
        .round();
    let y = rng
        .random_range(
            PLACEMENT_MARGIN + 2.0 * geom.corner_radius..=height - (span + PLACEMENT_MARGIN),
        )
        .round();
    DVec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mask::{outline_bounds, piece_outline};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_default_span() {
        // 42 + 18 + 3
        assert_eq!(PieceGeometry::default().span(), 63.0);
    }

    #[test]
    fn test_place_notch_within_ranges() {
        let geom = PieceGeometry::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let notch = place_notch(&mut rng, 310.0, 155.0, &geom);
            assert!(notch.x >= 73.0 && notch.x <= 237.0, "x = {}", notch.x);
            assert!(notch.y >= 28.0 && notch.y <= 82.0, "y = {}", notch.y);
            assert_eq!(notch.x, notch.x.round());
            assert_eq!(notch.y, notch.y.round());
        }
    }

    #[test]
    fn test_extract_origin() {
        let geom = PieceGeometry::default();
        let origin = geom.extract_origin(DVec2::new(100.0, 50.0));
        assert_eq!(origin, DVec2::new(97.0, 31.0));
    }

    proptest! {
        /// For every valid configuration the generated outline stays inside
        /// the canvas, stroke and concave bulge included.
        #[test]
        fn prop_placed_outline_stays_in_canvas(
            seed in any::<u64>(),
            piece_len in 20.0f64..80.0,
            corner_radius in 4.0f64..16.0,
            extra_w in 0.0f64..400.0,
            extra_h in 0.0f64..300.0,
        ) {
            let geom = PieceGeometry::new(piece_len, corner_radius);
            let span = geom.span();
            // Smallest canvas the setup validation would accept, plus slack
            let width = (2.0 * (span + 10.0) + 1.0 + extra_w).ceil();
            let height = ((span + 10.0) + (10.0 + 2.0 * corner_radius) + 1.0 + extra_h).ceil();

            let mut rng = Pcg32::seed_from_u64(seed);
            let notch = place_notch(&mut rng, width, height, &geom);
            let (min, max) = outline_bounds(&piece_outline(notch, &geom));

            prop_assert!(min.x >= 0.0, "min.x = {}", min.x);
            prop_assert!(min.y >= 0.0, "min.y = {}", min.y);
            prop_assert!(max.x <= width, "max.x = {} width = {}", max.x, width);
            prop_assert!(max.y <= height, "max.y = {} height = {}", max.y, height);
        }
    }
}
