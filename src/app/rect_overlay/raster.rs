// SPDX-License-Identifier: GPL-3.0-only

//! Raster rendering of overlay outlines
//!
//! Used for the GUI overlay layer, annotated snapshots and the CLI `detect`
//! output. Outlines are stroked in yellow over a translucent yellow fill.

use super::{OverlayPool, ViewPoint, ViewRect};
use crate::constants::overlay;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{Blend, BresenhamLineIter, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Opaque outline colour
pub fn stroke_color() -> Rgba<u8> {
    let (r, g, b) = overlay::STROKE_RGB;
    Rgba([channel(r), channel(g), channel(b), 255])
}

/// Translucent interior colour
pub fn fill_color() -> Rgba<u8> {
    let (r, g, b) = overlay::STROKE_RGB;
    Rgba([channel(r), channel(g), channel(b), channel(overlay::FILL_ALPHA)])
}

/// Pixels on the closed outline of `path`
pub fn outline_pixels(path: &[ViewPoint; 4]) -> impl Iterator<Item = (i32, i32)> + '_ {
    (0..4).flat_map(move |i| {
        let a = path[i];
        let b = path[(i + 1) % 4];
        BresenhamLineIter::new((a.x, a.y), (b.x, b.y))
    })
}

/// Fill and stroke each path onto `image`
pub fn draw_paths(image: &mut RgbaImage, paths: &[[ViewPoint; 4]]) {
    let fill = fill_color();
    let stroke = stroke_color();
    let width = overlay::STROKE_WIDTH.round().max(1.0) as i32;
    // Offsets straddle the edge so the stroke is centred on it
    let first = -(width / 2);

    for path in paths {
        if let Some(polygon) = fill_polygon(path) {
            let mut canvas = Blend(std::mem::take(image));
            draw_polygon_mut(&mut canvas, &polygon, fill);
            *image = canvas.0;
        }

        for i in 0..4 {
            let a = path[i];
            let b = path[(i + 1) % 4];
            for dx in first..first + width {
                for dy in first..first + width {
                    let (ox, oy) = (dx as f32, dy as f32);
                    draw_line_segment_mut(image, (a.x + ox, a.y + oy), (b.x + ox, b.y + oy), stroke);
                }
            }
        }
    }
}

/// Render the pool into a transparent layer the size of the frame
///
/// The stroke is drawn in frame pixels; the widget showing the layer scales
/// it with the preview.
pub fn render_layer(pool: &OverlayPool, width: u32, height: u32, mirrored: bool) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);
    let paths = pool.layout(ViewRect::from_size(width, height), mirrored);
    draw_paths(&mut layer, &paths);
    layer
}

/// Integer polygon for filling; `None` when the path collapses
fn fill_polygon(path: &[ViewPoint; 4]) -> Option<Vec<Point<i32>>> {
    let mut polygon: Vec<Point<i32>> = path
        .iter()
        .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect();
    polygon.dedup();
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    (polygon.len() >= 3).then_some(polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::{NormalizedPoint, Quadrilateral};

    fn centered_quad() -> Quadrilateral {
        Quadrilateral::new(
            NormalizedPoint::new(0.2, 0.8),
            NormalizedPoint::new(0.8, 0.8),
            NormalizedPoint::new(0.8, 0.2),
            NormalizedPoint::new(0.2, 0.2),
        )
    }

    #[test]
    fn test_draw_paths_fills_and_strokes() {
        let mut image = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let path = centered_quad().map_to(ViewRect::from_size(100, 100));
        draw_paths(&mut image, &[path]);

        // Left edge runs along x = 20
        assert_eq!(*image.get_pixel(20, 50), stroke_color());

        // Interior is tinted, not painted over
        let inside = image.get_pixel(50, 50);
        assert!(inside[0] > 0 && inside[0] < 255);
        assert_eq!(inside[2], 0);

        // Outside is untouched
        assert_eq!(*image.get_pixel(5, 5), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_stroke_is_centred_on_the_edge() {
        let mut image = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let path = centered_quad().map_to(ViewRect::from_size(100, 100));
        draw_paths(&mut image, &[path]);

        // Left edge at x = 20 straddles both sides
        assert_eq!(*image.get_pixel(19, 50), stroke_color());
        assert_eq!(*image.get_pixel(20, 50), stroke_color());
        assert_ne!(*image.get_pixel(21, 50), stroke_color());

        // Right edge at x = 80
        assert_eq!(*image.get_pixel(79, 50), stroke_color());
        assert_eq!(*image.get_pixel(80, 50), stroke_color());
        assert_eq!(*image.get_pixel(81, 50), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_render_layer_is_transparent_outside_shapes() {
        let mut pool = OverlayPool::new(2);
        pool.assign(&[centered_quad()]);
        let layer = render_layer(&pool, 100, 100, false);

        assert_eq!(layer.get_pixel(5, 5)[3], 0);
        assert_eq!(layer.get_pixel(20, 50)[3], 255);
        assert!(layer.get_pixel(50, 50)[3] > 0);
    }

    #[test]
    fn test_outline_pixels_cover_corners() {
        let path = centered_quad().map_to(ViewRect::from_size(100, 100));
        let pixels: Vec<(i32, i32)> = outline_pixels(&path).collect();
        assert!(pixels.contains(&(20, 20)));
        assert!(pixels.contains(&(80, 80)));
    }

    #[test]
    fn test_degenerate_path_is_not_filled() {
        let point = ViewPoint::new(3.0, 3.0);
        assert!(fill_polygon(&[point; 4]).is_none());
    }
}
