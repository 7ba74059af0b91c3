//! Annotation renderer: draws face boxes, labels and text-line outlines.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use lensbridge_core::{BridgeError, BridgeResult, FaceRegion, IdentifiedFace, Point, TextLine};
use tracing::debug;

use crate::geometry::{face_box, label_background, LABEL_HEIGHT};

pub const ANNOTATION_RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

pub const FACE_OUTLINE_WIDTH: i32 = 3;
pub const TEXT_LINE_WIDTH: i32 = 2;
pub const LABEL_FONT_PX: f32 = 12.0;

/// Draws annotations onto RGB rasters. Holds the label font, if any.
#[derive(Clone, Default)]
pub struct AnnotationRenderer {
    font: Option<FontArc>,
}

impl AnnotationRenderer {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    /// Load the label font from a TTF/OTF file.
    pub fn from_font_file(path: &Path) -> BridgeResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| BridgeError::Image(format!("read font {}: {e}", path.display())))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| BridgeError::Image(format!("parse font {}: {e}", path.display())))?;
        Ok(Self::new(Some(font)))
    }

    /// Red 3 px outline around the face, red label strip above it, white label
    /// text on the strip.
    pub fn draw_face_annotation(&self, image: &mut RgbImage, region: &FaceRegion, label: &str) {
        let bbox = face_box(region);
        // Outline grows inward from the box edges; both edges are inclusive.
        for inset in 0..FACE_OUTLINE_WIDTH {
            let w = bbox.width() + 1 - 2 * inset;
            let h = bbox.height() + 1 - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(bbox.left + inset, bbox.top + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, rect, ANNOTATION_RED);
        }

        let strip = label_background(region, label);
        if strip.width() <= 0 {
            return;
        }
        let rect = Rect::at(strip.left, strip.top).of_size(strip.width() as u32, LABEL_HEIGHT as u32);
        draw_filled_rect_mut(image, rect, ANNOTATION_RED);

        if let Some(font) = &self.font {
            draw_text_mut(
                image,
                LABEL_TEXT_COLOR,
                strip.left,
                strip.top,
                PxScale::from(LABEL_FONT_PX),
                font,
                label,
            );
        }
    }

    /// Closed 2 px red polyline through the four points.
    pub fn draw_text_line_annotation(&self, image: &mut RgbImage, polygon: &[Point; 4]) {
        for i in 0..polygon.len() {
            let start = polygon[i];
            let end = polygon[(i + 1) % polygon.len()];
            draw_thick_segment(image, start, end);
        }
    }

    /// Draw every face onto a fresh copy of `source`.
    pub fn annotate_faces(&self, source: &RgbImage, faces: &[IdentifiedFace]) -> RgbImage {
        let mut canvas = source.clone();
        for face in faces {
            self.draw_face_annotation(&mut canvas, &face.region, &face.label);
        }
        debug!(faces = faces.len(), "Rendered face annotations");
        canvas
    }

    /// Outline every text line on a fresh copy of `source`.
    pub fn annotate_text_lines(&self, source: &RgbImage, lines: &[TextLine]) -> RgbImage {
        let mut canvas = source.clone();
        for line in lines {
            self.draw_text_line_annotation(&mut canvas, &line.polygon);
        }
        debug!(lines = lines.len(), "Rendered text line annotations");
        canvas
    }
}

fn draw_thick_segment(image: &mut RgbImage, start: Point, end: Point) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    // Second stroke is offset across the dominant direction.
    let (ox, oy) = if dx.abs() >= dy.abs() { (0.0, 1.0) } else { (1.0, 0.0) };
    for step in 0..TEXT_LINE_WIDTH {
        let k = step as f32;
        draw_line_segment_mut(
            image,
            (start.0 + ox * k, start.1 + oy * k),
            (end.0 + ox * k, end.1 + oy * k),
            ANNOTATION_RED,
        );
    }
}

/// Decode any supported format into an RGB raster.
pub fn decode_rgb(bytes: &[u8]) -> BridgeResult<RgbImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| BridgeError::Image(format!("decode: {e}")))
}
