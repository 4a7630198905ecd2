//! Rasterisation of vector-drawing regions.

use std::collections::HashMap;

use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::content::{PathSegment, PathShape};
use super::geometry::Rect;
use crate::error::{Error, Result};

/// Narrowest stroke drawn, in page units.
const MIN_STROKE_WIDTH: f32 = 0.5;

/// A rendered region.
#[derive(Debug, Clone)]
pub struct RenderedRegion {
    pub width: u32,
    pub height: u32,
    /// PNG encoding of the render
    pub png: Vec<u8>,
    /// Share of pixels having the most frequent colour
    pub dominant_ratio: f32,
}

impl RenderedRegion {
    /// Whether the render carries no visible content.
    pub fn is_blank(&self, min_png_bytes: usize, max_dominant_ratio: f32) -> bool {
        self.png.len() < min_png_bytes || self.dominant_ratio > max_dominant_ratio
    }
}

/// Render the paths intersecting `region` onto a white canvas at `dpi`.
pub fn render_region(paths: &[PathShape], region: &Rect, dpi: f32) -> Result<RenderedRegion> {
    let scale = dpi / 72.0;
    let width = (region.width() * scale).ceil().max(1.0) as u32;
    let height = (region.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::Render(format!("cannot allocate {width}x{height} canvas")))?;
    pixmap.fill(Color::WHITE);

    let transform = Transform::from_row(
        scale,
        0.0,
        0.0,
        scale,
        -region.x0 * scale,
        -region.y0 * scale,
    );

    let mut drawn = 0usize;
    for shape in paths.iter().filter(|p| p.bbox.intersects(region)) {
        let Some(path) = build_path(&shape.segments) else {
            continue;
        };
        if let Some([r, g, b]) = shape.fill {
            let mut paint = Paint::default();
            paint.set_color_rgba8(r, g, b, 255);
            paint.anti_alias = true;
            let rule = if shape.even_odd {
                FillRule::EvenOdd
            } else {
                FillRule::Winding
            };
            pixmap.fill_path(&path, &paint, rule, transform, None);
        }
        if let Some([r, g, b]) = shape.stroke {
            let mut paint = Paint::default();
            paint.set_color_rgba8(r, g, b, 255);
            paint.anti_alias = true;
            let stroke = Stroke {
                width: shape.line_width.max(MIN_STROKE_WIDTH),
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
        drawn += 1;
    }

    let dominant_ratio = dominant_color_ratio(pixmap.data());
    let png = pixmap
        .encode_png()
        .map_err(|e| Error::Render(e.to_string()))?;

    log::debug!(
        "rendered {drawn} paths in {region} to {width}x{height} ({} bytes, dominant {:.4})",
        png.len(),
        dominant_ratio
    );

    Ok(RenderedRegion {
        width,
        height,
        png,
        dominant_ratio,
    })
}

fn build_path(segments: &[PathSegment]) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    let mut open = false;
    for segment in segments {
        match *segment {
            PathSegment::MoveTo(x, y) => {
                pb.move_to(x, y);
                open = true;
            }
            PathSegment::LineTo(x, y) if open => pb.line_to(x, y),
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) if open => {
                pb.cubic_to(x1, y1, x2, y2, x3, y3)
            }
            PathSegment::Close if open => pb.close(),
            _ => {}
        }
    }
    pb.finish()
}

/// Fraction of RGBA pixels sharing the most common value.
pub fn dominant_color_ratio(rgba: &[u8]) -> f32 {
    let total = rgba.len() / 4;
    if total == 0 {
        return 1.0;
    }
    let mut counts: HashMap<[u8; 4], usize> = HashMap::new();
    for px in rgba.chunks_exact(4) {
        *counts.entry([px[0], px[1], px[2], px[3]]).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    max as f32 / total as f32
}
