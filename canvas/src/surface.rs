//! Drawing surface: the subset of Canvas 2D the renderer uses.
//!
//! [`Surface`] is implemented for [`CanvasRenderingContext2d`] in the browser
//! and for [`DisplayList`], a recorder used by tests and by the CLI to dump
//! frames. Infallible Canvas 2D calls return `()`; the ones `web_sys` marks as
//! throwing return `Result<(), Self::Error>`.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use std::convert::Infallible;

use js_sys::Array;
use serde::Serialize;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::geom::Point;

pub trait Surface {
    type Error;
    type Image;

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), Self::Error>;
    fn save(&mut self);
    fn restore(&mut self);
    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn set_fill_color(&mut self, color: &str);
    /// Fill with a linear gradient from `from` to `to`; stops are `(offset, color)`.
    fn set_fill_linear_gradient(&mut self, from: Point, to: Point, stops: &[(f64, &str)]) -> Result<(), Self::Error>;
    fn set_stroke_color(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), Self::Error>;
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_shadow(&mut self, color: &str, blur: f64, offset_x: f64, offset_y: f64);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<(), Self::Error>;
    #[allow(clippy::too_many_arguments)]
    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start: f64,
        end: f64,
    ) -> Result<(), Self::Error>;

    fn translate(&mut self, x: f64, y: f64) -> Result<(), Self::Error>;
    fn rotate(&mut self, radians: f64) -> Result<(), Self::Error>;
    fn scale(&mut self, x: f64, y: f64) -> Result<(), Self::Error>;

    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: &str);
    fn set_text_baseline(&mut self, baseline: &str);
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), Self::Error>;

    fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64, w: f64, h: f64) -> Result<(), Self::Error>;
}

// =============================================================
// Browser canvas
// =============================================================

impl Surface for CanvasRenderingContext2d {
    type Error = JsValue;
    type Image = HtmlImageElement;

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::set_transform(self, a, b, c, d, e, f)
    }

    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::clear_rect(self, x, y, w, h);
    }

    fn set_fill_color(&mut self, color: &str) {
        self.set_fill_style_str(color);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn set_fill_linear_gradient(&mut self, from: Point, to: Point, stops: &[(f64, &str)]) -> Result<(), JsValue> {
        let gradient = self.create_linear_gradient(from.x, from.y, to.x, to.y);
        for (offset, color) in stops {
            gradient.add_color_stop(*offset as f32, color)?;
        }
        self.set_fill_style_canvas_gradient(&gradient);
        Ok(())
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.set_stroke_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), JsValue> {
        let dash: Array = segments.iter().map(|s| JsValue::from_f64(*s)).collect();
        CanvasRenderingContext2d::set_line_dash(self, &dash)
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        CanvasRenderingContext2d::set_global_alpha(self, alpha);
    }

    fn set_shadow(&mut self, color: &str, blur: f64, offset_x: f64, offset_y: f64) {
        self.set_shadow_color(color);
        self.set_shadow_blur(blur);
        self.set_shadow_offset_x(offset_x);
        self.set_shadow_offset_y(offset_y);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::stroke_rect(self, x, y, w, h);
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        CanvasRenderingContext2d::quadratic_curve_to(self, cpx, cpy, x, y);
    }

    fn close_path(&mut self) {
        CanvasRenderingContext2d::close_path(self);
    }

    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }

    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::arc(self, x, y, radius, start, end)
    }

    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start: f64,
        end: f64,
    ) -> Result<(), JsValue> {
        CanvasRenderingContext2d::ellipse(self, x, y, radius_x, radius_y, rotation, start, end)
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::translate(self, x, y)
    }

    fn rotate(&mut self, radians: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::rotate(self, radians)
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::scale(self, x, y)
    }

    fn set_font(&mut self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }

    fn set_text_align(&mut self, align: &str) {
        CanvasRenderingContext2d::set_text_align(self, align);
    }

    fn set_text_baseline(&mut self, baseline: &str) {
        CanvasRenderingContext2d::set_text_baseline(self, baseline);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), JsValue> {
        CanvasRenderingContext2d::fill_text(self, text, x, y)
    }

    fn draw_image(&mut self, image: &HtmlImageElement, x: f64, y: f64, w: f64, h: f64) -> Result<(), JsValue> {
        self.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, w, h)
    }
}

// =============================================================
// Recorder
// =============================================================

/// Image handle for recorded frames: just the asset key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef(pub String);

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    SetTransform { m: [f64; 6] },
    Save,
    Restore,
    ClearRect { x: f64, y: f64, w: f64, h: f64 },
    FillColor { color: String },
    FillGradient { from: Point, to: Point, stops: Vec<(f64, String)> },
    StrokeColor { color: String },
    LineWidth { width: f64 },
    LineDash { segments: Vec<f64> },
    GlobalAlpha { alpha: f64 },
    Shadow { color: String, blur: f64, offset_x: f64, offset_y: f64 },
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    StrokeRect { x: f64, y: f64, w: f64, h: f64 },
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadraticCurveTo { cpx: f64, cpy: f64, x: f64, y: f64 },
    ClosePath,
    Fill,
    Stroke,
    Arc { x: f64, y: f64, radius: f64, start: f64, end: f64 },
    Ellipse { x: f64, y: f64, radius_x: f64, radius_y: f64, rotation: f64 },
    Translate { x: f64, y: f64 },
    Rotate { radians: f64 },
    Scale { x: f64, y: f64 },
    Font { font: String },
    TextAlign { align: String },
    TextBaseline { baseline: String },
    FillText { text: String, x: f64, y: f64 },
    DrawImage { image: String, x: f64, y: f64, w: f64, h: f64 },
}

/// A [`Surface`] that records every call instead of drawing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayList {
    ops: Vec<DrawOp>,
}

impl DisplayList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Text of every `fill_text` call, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Asset keys of every drawn image, in order.
    #[must_use]
    pub fn images(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::DrawImage { image, .. } => Some(image.as_str()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }
}

impl Surface for DisplayList {
    type Error = Infallible;
    type Image = ImageRef;

    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), Infallible> {
        self.push(DrawOp::SetTransform { m: [a, b, c, d, e, f] });
        Ok(())
    }

    fn save(&mut self) {
        self.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.push(DrawOp::Restore);
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawOp::ClearRect { x, y, w, h });
    }

    fn set_fill_color(&mut self, color: &str) {
        self.push(DrawOp::FillColor { color: color.to_owned() });
    }

    fn set_fill_linear_gradient(&mut self, from: Point, to: Point, stops: &[(f64, &str)]) -> Result<(), Infallible> {
        let stops = stops.iter().map(|(o, c)| (*o, (*c).to_owned())).collect();
        self.push(DrawOp::FillGradient { from, to, stops });
        Ok(())
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.push(DrawOp::StrokeColor { color: color.to_owned() });
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawOp::LineWidth { width });
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), Infallible> {
        self.push(DrawOp::LineDash { segments: segments.to_vec() });
        Ok(())
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.push(DrawOp::GlobalAlpha { alpha });
    }

    fn set_shadow(&mut self, color: &str, blur: f64, offset_x: f64, offset_y: f64) {
        self.push(DrawOp::Shadow { color: color.to_owned(), blur, offset_x, offset_y });
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawOp::FillRect { x, y, w, h });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawOp::StrokeRect { x, y, w, h });
    }

    fn begin_path(&mut self) {
        self.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawOp::LineTo { x, y });
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.push(DrawOp::QuadraticCurveTo { cpx, cpy, x, y });
    }

    fn close_path(&mut self) {
        self.push(DrawOp::ClosePath);
    }

    fn fill(&mut self) {
        self.push(DrawOp::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawOp::Stroke);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<(), Infallible> {
        self.push(DrawOp::Arc { x, y, radius, start, end });
        Ok(())
    }

    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        _start: f64,
        _end: f64,
    ) -> Result<(), Infallible> {
        self.push(DrawOp::Ellipse { x, y, radius_x, radius_y, rotation });
        Ok(())
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), Infallible> {
        self.push(DrawOp::Translate { x, y });
        Ok(())
    }

    fn rotate(&mut self, radians: f64) -> Result<(), Infallible> {
        self.push(DrawOp::Rotate { radians });
        Ok(())
    }

    fn scale(&mut self, x: f64, y: f64) -> Result<(), Infallible> {
        self.push(DrawOp::Scale { x, y });
        Ok(())
    }

    fn set_font(&mut self, font: &str) {
        self.push(DrawOp::Font { font: font.to_owned() });
    }

    fn set_text_align(&mut self, align: &str) {
        self.push(DrawOp::TextAlign { align: align.to_owned() });
    }

    fn set_text_baseline(&mut self, baseline: &str) {
        self.push(DrawOp::TextBaseline { baseline: baseline.to_owned() });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), Infallible> {
        self.push(DrawOp::FillText { text: text.to_owned(), x, y });
        Ok(())
    }

    fn draw_image(&mut self, image: &ImageRef, x: f64, y: f64, w: f64, h: f64) -> Result<(), Infallible> {
        self.push(DrawOp::DrawImage { image: image.0.clone(), x, y, w, h });
        Ok(())
    }
}
