//! Canvas drawing: mask painting, photo compositing, piece extraction
//!
//! This module is the only place that touches [`CanvasRenderingContext2d`].
//! It replays the core's outline commands; all fallible canvas calls
//! propagate `Result<_, JsValue>` to the widget shell.

use glam::DVec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::session::geometry::PieceGeometry;
use crate::session::mask::{MASK_STYLE, MaskOp, PathCommand, piece_outline};

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("not a 2d context"))
}

fn trace(ctx: &CanvasRenderingContext2d, commands: &[PathCommand]) -> Result<(), JsValue> {
    ctx.begin_path();
    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathCommand::LineTo(p) => ctx.line_to(p.x, p.y),
            PathCommand::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            } => ctx.arc_with_anticlockwise(
                center.x,
                center.y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            )?,
        }
    }
    Ok(())
}

/// Stroke the jigsaw outline at `notch` and apply the mask operation, then
/// switch compositing to `destination-over` so the photo drawn next lands
/// behind the mask.
pub fn paint_mask(
    ctx: &CanvasRenderingContext2d,
    notch: DVec2,
    geom: &PieceGeometry,
    op: MaskOp,
) -> Result<(), JsValue> {
    trace(ctx, &piece_outline(notch, geom))?;
    ctx.set_line_width(1.0);
    ctx.set_fill_style_str(MASK_STYLE);
    ctx.set_stroke_style_str(MASK_STYLE);
    ctx.stroke();
    match op {
        MaskOp::Fill => ctx.fill(),
        MaskOp::Clip => ctx.clip(),
    }
    ctx.set_global_composite_operation("destination-over")
}

/// Draw a full puzzle round: masked background, clipped piece, then lift the
/// piece pixels into a canvas exactly one span wide.
pub fn render_puzzle(
    background: &CanvasRenderingContext2d,
    piece_canvas: &HtmlCanvasElement,
    piece: &CanvasRenderingContext2d,
    image: &HtmlImageElement,
    notch: DVec2,
    geom: &PieceGeometry,
    width: f64,
    height: f64,
) -> Result<(), JsValue> {
    paint_mask(background, notch, geom, MaskOp::Fill)?;
    paint_mask(piece, notch, geom, MaskOp::Clip)?;
    background.draw_image_with_html_image_element_and_dw_and_dh(image, 0.0, 0.0, width, height)?;
    piece.draw_image_with_html_image_element_and_dw_and_dh(image, 0.0, 0.0, width, height)?;

    let span = geom.span();
    let origin = geom.extract_origin(notch);
    let data = piece.get_image_data(origin.x, origin.y, span, span)?;
    // resizing resets the piece context, dropping the clip for the next round
    piece_canvas.set_width(span as u32);
    piece.put_image_data(&data, 0.0, origin.y)
}

/// Clear both canvases for a new round; restoring the piece canvas width
/// also resets its context state.
pub fn clear_round(
    background: &CanvasRenderingContext2d,
    piece_canvas: &HtmlCanvasElement,
    piece: &CanvasRenderingContext2d,
    width: f64,
    height: f64,
) {
    background.clear_rect(0.0, 0.0, width, height);
    piece_canvas.set_width(width as u32);
    piece.clear_rect(0.0, 0.0, width, height);
}
