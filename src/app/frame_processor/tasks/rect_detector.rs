// SPDX-License-Identifier: GPL-3.0-only

//! Rectangle detection task
//!
//! Finds rectangle-like quadrilaterals in a frame using contour tracing:
//! the oriented frame is converted to grayscale, downscaled, binarised with
//! Otsu's threshold, and every traced contour is simplified to a polygon.
//! Convex four-sided polygons that pass the size, aspect ratio and corner
//! angle checks are reported, largest first.

use crate::app::frame_processor::frame_image::apply_orientation;
use crate::app::frame_processor::types::{
    DetectionConfig, DeviceOrientation, FrameMetadata, NormalizedPoint, Quadrilateral,
};
use crate::constants::detection;
use crate::errors::DetectionError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use imageproc::contours::find_contours;
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::{debug, trace};

/// Light blur applied before thresholding to suppress sensor noise
const BLUR_SIGMA: f32 = 1.0;

type Vertex = (f64, f64);

/// Finds rectangles in a single frame
///
/// Implementations must be usable from a blocking worker thread while the UI
/// keeps running, hence `Send + Sync`.
pub trait RectangleDetector: Send + Sync {
    /// Detect rectangles in an RGBA frame
    ///
    /// Returned quadrilaterals are normalized to the oriented frame with a
    /// bottom-left origin, sorted by area (largest first) and capped at
    /// `config.maximum_observations`.
    fn detect(
        &self,
        image: &RgbaImage,
        metadata: &FrameMetadata,
        config: &DetectionConfig,
    ) -> Result<Vec<Quadrilateral>, DetectionError>;

    /// Short identifier for logs
    fn name(&self) -> &'static str;
}

/// Contour-based rectangle detector
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourRectDetector;

impl ContourRectDetector {
    pub fn new() -> Self {
        Self
    }
}

impl RectangleDetector for ContourRectDetector {
    fn detect(
        &self,
        image: &RgbaImage,
        metadata: &FrameMetadata,
        config: &DetectionConfig,
    ) -> Result<Vec<Quadrilateral>, DetectionError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectionError::InvalidFrame("empty image".to_string()));
        }
        if image.dimensions() != (metadata.width, metadata.height) {
            return Err(DetectionError::InvalidFrame(format!(
                "image is {}x{} but metadata says {}x{}",
                image.width(),
                image.height(),
                metadata.width,
                metadata.height
            )));
        }

        let start = std::time::Instant::now();

        if let Some(k) = metadata.intrinsics {
            // Contours are fitted in image space; lens geometry is not needed
            trace!(fx = k.fx, fy = k.fy, cx = k.cx, cy = k.cy, "Camera intrinsics supplied");
        }

        let gray = prepare_gray(image, metadata.orientation, config.max_dimension);
        let (width, height) = gray.dimensions();
        let binary = binarize(&gray);

        let prep_time = start.elapsed();
        trace!(
            width,
            height,
            orientation = ?metadata.orientation,
            prep_ms = prep_time.as_millis(),
            "Prepared binary image for contour tracing"
        );

        let min_side = config.minimum_size.clamp(0.0, 1.0) as f64 * width.min(height) as f64;

        let contours = find_contours::<i32>(&binary);
        let contour_count = contours.len();

        let mut candidates: Vec<[Vertex; 4]> = contours
            .iter()
            .filter(|c| c.points.len() >= detection::MIN_CONTOUR_POINTS)
            .filter(|c| !touches_border(&c.points, width, height))
            .filter_map(|c| fit_quadrilateral(&c.points, config, min_side))
            .collect();

        candidates.sort_by(|a, b| polygon_area(b).total_cmp(&polygon_area(a)));

        let quads: Vec<Quadrilateral> = suppress_duplicates(candidates)
            .iter()
            .take(config.maximum_observations)
            .map(|corners| normalize(corners, width, height))
            .collect();

        trace!(
            contours = contour_count,
            rectangles = quads.len(),
            total_ms = start.elapsed().as_millis(),
            "Rectangle detection complete"
        );
        if !quads.is_empty() {
            debug!(count = quads.len(), "Rectangle detection found shapes");
        }

        Ok(quads)
    }

    fn name(&self) -> &'static str {
        "contour"
    }
}

/// Grayscale, orient and downscale a frame for contour tracing
fn prepare_gray(image: &RgbaImage, orientation: DeviceOrientation, max_dimension: u32) -> GrayImage {
    let gray = imageops::grayscale(image);
    let gray = apply_orientation(DynamicImage::ImageLuma8(gray), orientation).into_luma8();

    let (width, height) = gray.dimensions();
    let longest = width.max(height);

    let gray = if max_dimension > 0 && longest > max_dimension {
        let scale = max_dimension as f32 / longest as f32;
        let new_width = ((width as f32 * scale).round() as u32).max(1);
        let new_height = ((height as f32 * scale).round() as u32).max(1);
        imageops::resize(&gray, new_width, new_height, FilterType::Triangle)
    } else {
        gray
    };

    gaussian_blur_f32(&gray, BLUR_SIGMA)
}

/// Binarise with Otsu's threshold; bright regions become foreground
fn binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Shapes cut off by the frame edge are not closed rectangles
fn touches_border(points: &[Point<i32>], width: u32, height: u32) -> bool {
    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;
    points
        .iter()
        .any(|p| p.x <= 0 || p.y <= 0 || p.x >= max_x || p.y >= max_y)
}

/// Fit a rectangle-like quadrilateral to a contour
///
/// Returns corners in pixel space ordered top-left, top-right, bottom-right,
/// bottom-left.
fn fit_quadrilateral(
    points: &[Point<i32>],
    config: &DetectionConfig,
    min_side: f64,
) -> Option<[Vertex; 4]> {
    let mut contour = points;
    if contour.len() > 1 && contour.first() == contour.last() {
        contour = &contour[..contour.len() - 1];
    }
    if contour.len() < 4 {
        return None;
    }

    let perimeter = arc_length(contour, true);
    let epsilon = perimeter * detection::POLYGON_EPSILON_RATIO;
    if !(epsilon > 0.0) {
        return None;
    }

    let polygon = approximate_polygon_dp(contour, epsilon, true);
    let vertices = prune_vertices(
        polygon.iter().map(|p| (p.x as f64, p.y as f64)).collect(),
        epsilon,
    );

    let corners: [Vertex; 4] = vertices.try_into().ok()?;
    let corners = order_corners(corners)?;

    is_rectangle_like(&corners, config, min_side).then_some(corners)
}

/// Drop repeated and nearly collinear vertices from a closed polygon
fn prune_vertices(mut vertices: Vec<Vertex>, tolerance: f64) -> Vec<Vertex> {
    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    while vertices.len() > 3 {
        let n = vertices.len();
        let weakest = (0..n)
            .map(|i| {
                let prev = vertices[(i + n - 1) % n];
                let next = vertices[(i + 1) % n];
                (i, distance_to_line(vertices[i], prev, next))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match weakest {
            Some((i, distance)) if distance < tolerance => {
                vertices.remove(i);
            }
            _ => break,
        }
    }

    vertices
}

fn distance_to_line(p: Vertex, a: Vertex, b: Vertex) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    if len < f64::EPSILON {
        return (p.0 - a.0).hypot(p.1 - a.1);
    }
    (dx * (p.1 - a.1) - dy * (p.0 - a.0)).abs() / len
}

/// Order a convex quadrilateral clockwise (as seen on screen) from its top-left corner
///
/// Returns `None` for non-convex or degenerate polygons.
fn order_corners(mut corners: [Vertex; 4]) -> Option<[Vertex; 4]> {
    let mut sign = 0.0f64;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let c = corners[(i + 2) % 4];
        let cross = (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0);
        if cross.abs() < f64::EPSILON {
            return None;
        }
        if sign != 0.0 && cross.signum() != sign {
            return None;
        }
        sign = cross.signum();
    }

    // Positive turn with y pointing down is clockwise on screen
    if sign < 0.0 {
        corners.reverse();
    }

    let start = (0..4)
        .min_by(|&a, &b| {
            let ka = corners[a].0 + corners[a].1;
            let kb = corners[b].0 + corners[b].1;
            ka.total_cmp(&kb)
        })
        .unwrap_or(0);
    corners.rotate_left(start);

    Some(corners)
}

fn is_rectangle_like(corners: &[Vertex; 4], config: &DetectionConfig, min_side: f64) -> bool {
    let side = |i: usize| {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        (b.0 - a.0).hypot(b.1 - a.1)
    };

    let horizontal = (side(0) + side(2)) / 2.0;
    let vertical = (side(1) + side(3)) / 2.0;
    let short = horizontal.min(vertical);
    let long = horizontal.max(vertical);

    if long <= 0.0 || short < min_side {
        return false;
    }
    if short / long < config.minimum_aspect_ratio as f64 {
        return false;
    }

    let tolerance = config.quadrature_tolerance_degrees as f64;
    (0..4).all(|i| {
        let p = corners[i];
        let prev = corners[(i + 3) % 4];
        let next = corners[(i + 1) % 4];
        let v1 = (prev.0 - p.0, prev.1 - p.1);
        let v2 = (next.0 - p.0, next.1 - p.1);
        let cos = (v1.0 * v2.0 + v1.1 * v2.1) / (v1.0.hypot(v1.1) * v2.0.hypot(v2.1));
        let angle = cos.clamp(-1.0, 1.0).acos().to_degrees();
        (angle - 90.0).abs() <= tolerance
    })
}

fn polygon_area(corners: &[Vertex; 4]) -> f64 {
    let twice: f64 = (0..4)
        .map(|i| {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            a.0 * b.1 - b.0 * a.1
        })
        .sum();
    twice.abs() / 2.0
}

/// Drop candidates whose corners all sit next to those of a larger kept one
///
/// The outer and hole contours of a thin outline both trace the same shape.
/// `candidates` must be sorted largest first.
fn suppress_duplicates(candidates: Vec<[Vertex; 4]>) -> Vec<[Vertex; 4]> {
    let mut kept: Vec<[Vertex; 4]> = Vec::with_capacity(candidates.len());

    for corners in candidates {
        let duplicate = kept.iter().any(|larger| {
            let short_side = (0..4)
                .map(|i| {
                    let a = larger[i];
                    let b = larger[(i + 1) % 4];
                    (b.0 - a.0).hypot(b.1 - a.1)
                })
                .fold(f64::INFINITY, f64::min);
            let tolerance = short_side * detection::DUPLICATE_CORNER_RATIO;

            larger
                .iter()
                .zip(corners.iter())
                .all(|(a, b)| (a.0 - b.0).hypot(a.1 - b.1) <= tolerance)
        });

        if duplicate {
            trace!(?corners, "Dropping nested duplicate rectangle");
        } else {
            kept.push(corners);
        }
    }

    kept
}

/// Convert pixel corners (pixel centres) into observation space
fn normalize(corners: &[Vertex; 4], width: u32, height: u32) -> Quadrilateral {
    let point =
        |v: Vertex| NormalizedPoint::from_pixel(v.0 as f32 + 0.5, v.1 as f32 + 0.5, width, height);
    Quadrilateral::new(
        point(corners[0]),
        point(corners[1]),
        point(corners[2]),
        point(corners[3]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Black canvas with white filled rectangles given as (x0, y0, x1, y1), end exclusive
    fn canvas(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let inside = rects
                .iter()
                .any(|&(x0, y0, x1, y1)| x >= x0 && x < x1 && y >= y0 && y < y1);
            if inside {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    fn detect(image: &RgbaImage, config: &DetectionConfig) -> Vec<Quadrilateral> {
        let metadata = FrameMetadata::new(image.width(), image.height());
        ContourRectDetector::new()
            .detect(image, &metadata, config)
            .expect("detection should succeed")
    }

    fn assert_near(actual: NormalizedPoint, x: f32, y: f32) {
        assert!(
            (actual.x - x).abs() < 0.02 && (actual.y - y).abs() < 0.02,
            "expected ({x}, {y}), got ({}, {})",
            actual.x,
            actual.y
        );
    }

    #[test]
    fn test_detects_single_rectangle() {
        let image = canvas(160, 120, &[(40, 30, 120, 90)]);
        let quads = detect(&image, &DetectionConfig::default());

        assert_eq!(quads.len(), 1);
        let quad = quads[0];
        assert_near(quad.top_left, 0.25, 0.75);
        assert_near(quad.top_right, 0.75, 0.75);
        assert_near(quad.bottom_right, 0.75, 0.25);
        assert_near(quad.bottom_left, 0.25, 0.25);
    }

    #[test]
    fn test_blank_frame_has_no_rectangles() {
        let image = canvas(160, 120, &[]);
        assert!(detect(&image, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_rejects_shapes_below_minimum_size() {
        // 6px square is below 10% of the 120px short side
        let image = canvas(160, 120, &[(20, 20, 26, 26)]);
        assert!(detect(&image, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_rejects_thin_strips() {
        let image = canvas(160, 120, &[(20, 50, 140, 65)]);
        assert!(detect(&image, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_rejects_shapes_touching_the_border() {
        let image = canvas(160, 120, &[(0, 30, 80, 90)]);
        assert!(detect(&image, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_maximum_observations_keeps_largest() {
        let image = canvas(160, 120, &[(20, 20, 70, 60), (100, 70, 140, 100)]);

        let all = detect(&image, &DetectionConfig::default());
        assert_eq!(all.len(), 2);
        assert!(all[0].area() >= all[1].area());

        let config = DetectionConfig {
            maximum_observations: 1,
            ..DetectionConfig::default()
        };
        let capped = detect(&image, &config);
        assert_eq!(capped.len(), 1);
        assert_near(capped[0].top_left, 20.5 / 160.0, 1.0 - 20.5 / 120.0);
    }

    #[test]
    fn test_downscaled_frames_keep_normalized_positions() {
        let image = canvas(1280, 960, &[(320, 240, 960, 720)]);
        let quads = detect(&image, &DetectionConfig::default());

        assert_eq!(quads.len(), 1);
        assert_near(quads[0].top_left, 0.25, 0.75);
        assert_near(quads[0].bottom_right, 0.75, 0.25);
    }

    #[test]
    fn test_orientation_is_applied_before_detection() {
        // Rectangle in the top-left of the raw frame ends up top-right once
        // the frame is rotated 90 degrees clockwise
        let image = canvas(160, 120, &[(10, 10, 60, 50)]);
        let metadata = FrameMetadata::new(160, 120).with_orientation(DeviceOrientation::LandscapeLeft);

        let quads = ContourRectDetector::new()
            .detect(&image, &metadata, &DetectionConfig::default())
            .expect("detection should succeed");

        assert_eq!(quads.len(), 1);
        assert!(quads[0].top_left.x > 0.5);
        assert!(quads[0].top_left.y > 0.85);
    }

    #[test]
    fn test_thin_outline_reported_once() {
        // 4px white frame around a black interior traces an outer and a hole contour
        let image = RgbaImage::from_fn(160, 120, |x, y| {
            let outer = (40..120).contains(&x) && (30..90).contains(&y);
            let inner = (44..116).contains(&x) && (34..86).contains(&y);
            if outer && !inner {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });

        let quads = detect(&image, &DetectionConfig::default());
        assert_eq!(quads.len(), 1);
        assert_near(quads[0].top_left, 0.25, 0.75);
    }

    #[test]
    fn test_suppress_duplicates_keeps_distinct_nested_shapes() {
        let outer = [(0.0, 0.0), (100.0, 0.0), (100.0, 80.0), (0.0, 80.0)];
        let close = [(3.0, 3.0), (97.0, 3.0), (97.0, 77.0), (3.0, 77.0)];
        let inset = [(30.0, 20.0), (70.0, 20.0), (70.0, 60.0), (30.0, 60.0)];

        let kept = suppress_duplicates(vec![outer, close, inset]);
        assert_eq!(kept, vec![outer, inset]);
    }

    #[test]
    fn test_metadata_mismatch_is_an_error() {
        let image = canvas(16, 16, &[]);
        let metadata = FrameMetadata::new(32, 16);
        let result = ContourRectDetector::new().detect(&image, &metadata, &DetectionConfig::default());
        assert!(matches!(result, Err(DetectionError::InvalidFrame(_))));
    }

    #[test]
    fn test_order_corners_starts_top_left_clockwise() {
        // Counter-clockwise input starting at bottom-right
        let corners = [(10.0, 10.0), (10.0, 0.0), (0.0, 0.0), (0.0, 10.0)];
        let ordered = order_corners(corners).expect("convex");
        assert_eq!(ordered, [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
    }

    #[test]
    fn test_order_corners_rejects_concave() {
        let corners = [(0.0, 0.0), (10.0, 0.0), (2.0, 2.0), (0.0, 10.0)];
        assert!(order_corners(corners).is_none());
    }

    #[test]
    fn test_prune_vertices_removes_collinear_points() {
        let vertices = vec![
            (0.0, 0.0),
            (5.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ];
        let pruned = prune_vertices(vertices, 1.0);
        assert_eq!(pruned.len(), 4);
        assert!(!pruned.contains(&(5.0, 0.0)));
    }
}
