// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame detection dispatch
//!
//! The dispatcher turns a camera frame into detection results. Failures are
//! logged and reported as `None` so callers simply skip the redraw. Only one
//! detection runs at a time; frames that arrive while it is busy are dropped.

use super::frame_image::frame_to_rgba_image;
use super::tasks::{ContourRectDetector, RectangleDetector};
use super::types::{DetectionConfig, FrameMetadata, Quadrilateral};
use crate::backends::camera::types::CameraFrame;
use crate::constants::timing;
use crate::errors::DetectionError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Runs a [`RectangleDetector`] on camera frames
#[derive(Clone)]
pub struct FrameDispatcher {
    detector: Arc<dyn RectangleDetector>,
    config: DetectionConfig,
    in_flight: Arc<AtomicBool>,
}

impl std::fmt::Debug for FrameDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDispatcher")
            .field("detector", &self.detector.name())
            .field("config", &self.config)
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl Default for FrameDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(ContourRectDetector::new()), DetectionConfig::default())
    }
}

/// Clears the in-flight flag when the detection finishes (or panics)
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FrameDispatcher {
    pub fn new(detector: Arc<dyn RectangleDetector>, config: DetectionConfig) -> Self {
        Self {
            detector,
            config,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Replace the detection settings used for subsequent frames
    pub fn set_config(&mut self, config: DetectionConfig) {
        self.config = config;
    }

    /// Whether a detection is currently running
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run detection synchronously
    ///
    /// Returns `None` when the frame cannot be used or the detector fails.
    pub fn dispatch(
        &self,
        frame: &CameraFrame,
        metadata: &FrameMetadata,
    ) -> Option<Vec<Quadrilateral>> {
        let image = match frame_to_rgba_image(frame) {
            Ok(image) => image,
            Err(e) => {
                warn!(sequence = frame.sequence, error = %e, "Skipping frame without usable buffer");
                return None;
            }
        };

        match self.detector.detect(&image, metadata, &self.config) {
            Ok(quads) => {
                if frame.sequence % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        sequence = frame.sequence,
                        detector = self.detector.name(),
                        count = quads.len(),
                        latency_ms = frame.captured_at.elapsed().as_millis(),
                        "Rectangle detection result"
                    );
                }
                Some(quads)
            }
            Err(e) => {
                warn!(sequence = frame.sequence, error = %e, "Rectangle detection failed");
                None
            }
        }
    }

    /// Run detection on tokio's blocking pool
    ///
    /// Returns `None` immediately if another detection is still running.
    pub async fn dispatch_async(
        &self,
        frame: Arc<CameraFrame>,
        metadata: FrameMetadata,
    ) -> Option<Vec<Quadrilateral>> {
        let guard = match self.try_claim() {
            Some(guard) => guard,
            None => {
                debug!(sequence = frame.sequence, "Detection busy, dropping frame");
                return None;
            }
        };

        let dispatcher = self.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            dispatcher.dispatch(&frame, &metadata)
        })
        .await;

        match result {
            Ok(quads) => quads,
            Err(e) => {
                let error = DetectionError::TaskFailed(e.to_string());
                warn!(%error, "Rectangle detection task panicked");
                None
            }
        }
    }

    fn try_claim(&self) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(Arc::clone(&self.in_flight)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::types::NormalizedPoint;
    use image::RgbaImage;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    struct FixedDetector {
        calls: AtomicUsize,
    }

    impl RectangleDetector for FixedDetector {
        fn detect(
            &self,
            _image: &RgbaImage,
            _metadata: &FrameMetadata,
            config: &DetectionConfig,
        ) -> Result<Vec<Quadrilateral>, DetectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let quad = Quadrilateral::new(
                NormalizedPoint::new(0.1, 0.9),
                NormalizedPoint::new(0.9, 0.9),
                NormalizedPoint::new(0.9, 0.1),
                NormalizedPoint::new(0.1, 0.1),
            );
            Ok(vec![quad; 3].into_iter().take(config.maximum_observations).collect())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingDetector;

    impl RectangleDetector for FailingDetector {
        fn detect(
            &self,
            _image: &RgbaImage,
            _metadata: &FrameMetadata,
            _config: &DetectionConfig,
        ) -> Result<Vec<Quadrilateral>, DetectionError> {
            Err(DetectionError::Image("unsupported".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn frame(len: usize) -> CameraFrame {
        CameraFrame {
            width: 4,
            height: 4,
            data: Arc::from(vec![0u8; len].as_slice()),
            stride: 16,
            sequence: 1,
            captured_at: Instant::now(),
        }
    }

    fn fixed() -> (Arc<FixedDetector>, FrameDispatcher) {
        let detector = Arc::new(FixedDetector {
            calls: AtomicUsize::new(0),
        });
        let dispatcher = FrameDispatcher::new(detector.clone(), DetectionConfig::default());
        (detector, dispatcher)
    }

    #[test]
    fn test_dispatch_forwards_results() {
        let (detector, dispatcher) = fixed();
        let quads = dispatcher.dispatch(&frame(64), &FrameMetadata::new(4, 4));
        assert_eq!(quads.map(|q| q.len()), Some(3));
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_passes_config() {
        let (_, mut dispatcher) = fixed();
        dispatcher.set_config(DetectionConfig {
            maximum_observations: 1,
            ..DetectionConfig::default()
        });
        let quads = dispatcher.dispatch(&frame(64), &FrameMetadata::new(4, 4));
        assert_eq!(quads.map(|q| q.len()), Some(1));
    }

    #[test]
    fn test_short_buffer_skips_detection() {
        let (detector, dispatcher) = fixed();
        assert!(dispatcher.dispatch(&frame(10), &FrameMetadata::new(4, 4)).is_none());
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detector_error_yields_none() {
        let dispatcher = FrameDispatcher::new(Arc::new(FailingDetector), DetectionConfig::default());
        assert!(dispatcher.dispatch(&frame(64), &FrameMetadata::new(4, 4)).is_none());
    }

    #[tokio::test]
    async fn test_dispatch_async_releases_in_flight_flag() {
        let (_, dispatcher) = fixed();
        let quads = dispatcher
            .dispatch_async(Arc::new(frame(64)), FrameMetadata::new(4, 4))
            .await;
        assert_eq!(quads.map(|q| q.len()), Some(3));
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn test_busy_dispatcher_drops_frames() {
        let (detector, dispatcher) = fixed();
        let guard = dispatcher.try_claim().expect("idle dispatcher");
        assert!(dispatcher.is_busy());

        let quads = dispatcher
            .dispatch_async(Arc::new(frame(64)), FrameMetadata::new(4, 4))
            .await;
        assert!(quads.is_none());
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);

        drop(guard);
        assert!(!dispatcher.is_busy());
    }
}
