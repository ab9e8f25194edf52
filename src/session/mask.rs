//! Jigsaw mask outline
//!
//! The outline is emitted as a command list so the core stays free of canvas
//! types; the widget's draw layer replays it onto a 2D context. The same
//! outline serves both mask operations: filled on the background canvas to
//! darken the notch, used as a clip on the piece canvas to cut the piece out
//! of the photo.

use std::f64::consts::PI;

use glam::DVec2;

use super::geometry::PieceGeometry;

/// Fill/stroke color of the mask outline
pub const MASK_STYLE: &str = "rgba(255, 255, 255, 0.7)";

/// Follow-up operation after stroking the outline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskOp {
    /// Darken the notch hole (background canvas)
    Fill,
    /// Cut the piece pixels out (piece canvas)
    Clip,
}

/// One step of the outline path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(DVec2),
    LineTo(DVec2),
    Arc {
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
}

/// Build the closed jigsaw outline anchored at `origin` (top-left of the
/// square body). Top and right edges carry convex tab bumps; the left edge
/// carries a slightly larger concave notch.
pub fn piece_outline(origin: DVec2, geom: &PieceGeometry) -> Vec<PathCommand> {
    let (x, y) = (origin.x, origin.y);
    let s = geom.piece_len;
    let r = geom.corner_radius;

    vec![
        PathCommand::MoveTo(origin),
        // top bump
        PathCommand::Arc {
            center: DVec2::new(x + s / 2.0, y - r + 2.0),
            radius: r,
            start_angle: 0.72 * PI,
            end_angle: 2.26 * PI,
            anticlockwise: false,
        },
        PathCommand::LineTo(DVec2::new(x + s, y)),
        // right bump
        PathCommand::Arc {
            center: DVec2::new(x + s + r - 2.0, y + s / 2.0),
            radius: r,
            start_angle: 1.21 * PI,
            end_angle: 2.78 * PI,
            anticlockwise: false,
        },
        PathCommand::LineTo(DVec2::new(x + s, y + s)),
        PathCommand::LineTo(DVec2::new(x, y + s)),
        // concave notch on the left edge, swept backwards
        PathCommand::Arc {
            center: DVec2::new(x + r - 2.0, y + s / 2.0),
            radius: r + 0.4,
            start_angle: 2.76 * PI,
            end_angle: 1.24 * PI,
            anticlockwise: true,
        },
        PathCommand::LineTo(origin),
    ]
}

/// Conservative bounding box of an outline: arcs contribute their full
/// `center ± radius` box, points contribute themselves. Half the 1px stroke
/// is added on every side.
pub fn outline_bounds(commands: &[PathCommand]) -> (DVec2, DVec2) {
    let mut min = DVec2::splat(f64::INFINITY);
    let mut max = DVec2::splat(f64::NEG_INFINITY);
    let mut cover = |p: DVec2| {
        min = min.min(p);
        max = max.max(p);
    };
    for command in commands {
        match *command {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => cover(p),
            PathCommand::Arc { center, radius, .. } => {
                cover(center - DVec2::splat(radius));
                cover(center + DVec2::splat(radius));
            }
        }
    }
    (min - DVec2::splat(0.5), max + DVec2::splat(0.5))
}
