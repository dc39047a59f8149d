pub mod builder;

use std::borrow::Cow;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::{
    alert::{AlertStateMachine, AlertUpdate, Observation},
    algorithms::{BlobSelector, ProximityEvaluator},
    error::{GuardError, Result},
    traits::{ColorSegmenter, ContourExtractor, FrameSource, HullBuilder, MaskRefiner, ResultSink},
    types::{AlertLevel, FrameResult, FrameStatus, HazardZone, Hull, Proximity},
};

/// What the geometry stages produced for one frame
struct Perception {
    status: FrameStatus,
    hull: Option<Hull>,
    proximity: Option<Proximity>,
}

impl Perception {
    fn skipped() -> Self {
        Self {
            status: FrameStatus::Skipped,
            hull: None,
            proximity: None,
        }
    }

    fn no_hand() -> Self {
        Self {
            status: FrameStatus::NoHand,
            hull: None,
            proximity: None,
        }
    }

    fn observation(&self) -> Observation {
        match self.proximity {
            Some(proximity) => Observation::Distance(proximity.distance),
            None => Observation::NoDetection,
        }
    }
}

/// Counters over a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub frames: u64,
    pub detections: u64,
    pub skipped: u64,
    pub transitions: u64,
    pub final_level: AlertLevel,
}

impl RunSummary {
    fn record(&mut self, result: &FrameResult) {
        self.frames += 1;
        match result.status {
            FrameStatus::Detected => self.detections += 1,
            FrameStatus::Skipped => self.skipped += 1,
            FrameStatus::NoHand => {}
        }
        if result.transitioned {
            self.transitions += 1;
        }
        self.final_level = result.level;
    }
}

/// Runs segmentation, refinement, extraction, hull, proximity and alert
/// update for each frame, in that order, and publishes the result.
pub struct FrameOrchestrator {
    segmenter: Box<dyn ColorSegmenter>,
    refiner: Box<dyn MaskRefiner>,
    contour_extractor: Box<dyn ContourExtractor>,
    selector: BlobSelector,
    hull_builder: Box<dyn HullBuilder>,
    configured_zone: Option<HazardZone>,
    smoothing_window: usize,
    proximity: Option<ProximityEvaluator>,
    alerts: AlertStateMachine,
    frame_size: Option<(u32, u32)>,
    mirror: bool,
    sinks: Vec<Box<dyn ResultSink>>,
}

impl FrameOrchestrator {
    /// Create a new orchestrator builder
    pub fn builder() -> builder::OrchestratorBuilder {
        builder::OrchestratorBuilder::new()
    }

    /// Build an orchestrator with the default stages for a configuration
    pub fn from_config(config: crate::config::GuardConfig) -> Result<Self> {
        Self::builder().with_config(config).build()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        segmenter: Box<dyn ColorSegmenter>,
        refiner: Box<dyn MaskRefiner>,
        contour_extractor: Box<dyn ContourExtractor>,
        selector: BlobSelector,
        hull_builder: Box<dyn HullBuilder>,
        configured_zone: Option<HazardZone>,
        smoothing_window: usize,
        alerts: AlertStateMachine,
        frame_size: Option<(u32, u32)>,
        mirror: bool,
        sinks: Vec<Box<dyn ResultSink>>,
    ) -> Result<Self> {
        let proximity = configured_zone
            .clone()
            .map(|zone| ProximityEvaluator::new(zone, smoothing_window))
            .transpose()?;

        info!(
            zone = ?configured_zone,
            smoothing_window,
            grace_frames = alerts.policy().grace_frames,
            warning_threshold = alerts.policy().warning_threshold,
            "hand guard session ready"
        );

        Ok(Self {
            segmenter,
            refiner,
            contour_extractor,
            selector,
            hull_builder,
            configured_zone,
            smoothing_window,
            proximity,
            alerts,
            frame_size,
            mirror,
            sinks,
        })
    }

    pub fn add_sink<S>(&mut self, sink: S)
    where
        S: ResultSink + 'static,
    {
        self.sinks.push(Box::new(sink));
    }

    /// Current alert level
    pub fn level(&self) -> AlertLevel {
        self.alerts.level()
    }

    /// Session hazard zone, once known
    pub fn zone(&self) -> Option<&HazardZone> {
        self.proximity.as_ref().map(|p| p.zone())
    }

    /// Session frame size, once known
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }

    /// Process the next frame in temporal order
    pub fn process(&mut self, frame: &RgbImage) -> FrameResult {
        let perception = self.perceive(frame);
        let update = self.alerts.update(perception.observation());
        self.finish(perception, update)
    }

    /// Process a frame tagged with its capture sequence number.
    ///
    /// Frames that are not newer than the last applied one are rejected
    /// with [`GuardError::StaleFrame`] before any work is done.
    pub fn process_sequenced(&mut self, sequence: u64, frame: &RgbImage) -> Result<FrameResult> {
        if let Some(last_applied) = self.alerts.last_sequence() {
            if sequence <= last_applied {
                return Err(GuardError::StaleFrame {
                    sequence,
                    last_applied,
                });
            }
        }
        let perception = self.perceive(frame);
        let update = self.alerts.update_sequenced(sequence, perception.observation())?;
        Ok(self.finish(perception, update))
    }

    /// Record a cycle in which no frame could be obtained
    pub fn skip(&mut self) -> FrameResult {
        self.reset_smoothing();
        let update = self.alerts.update(Observation::NoDetection);
        self.finish(Perception::skipped(), update)
    }

    /// Pull one frame from the source; `None` when the source is exhausted
    pub fn process_next(&mut self, source: &mut dyn FrameSource) -> Option<FrameResult> {
        match source.next_frame()? {
            Ok(frame) => Some(self.process(&frame)),
            Err(err) => {
                warn!(error = %err, "frame acquisition failed, skipping cycle");
                Some(self.skip())
            }
        }
    }

    /// Drain a frame source
    pub fn run(&mut self, source: &mut dyn FrameSource) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(result) = self.process_next(source) {
            summary.record(&result);
        }
        info!(
            frames = summary.frames,
            detections = summary.detections,
            skipped = summary.skipped,
            transitions = summary.transitions,
            final_level = %summary.final_level,
            "run finished"
        );
        summary
    }

    fn reset_smoothing(&mut self) {
        if let Some(proximity) = self.proximity.as_mut() {
            proximity.reset();
        }
    }

    /// Check the frame against the session size, fixing it on first sight
    fn check_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(GuardError::EmptyFrame { width, height });
        }
        match self.frame_size {
            Some((expected_width, expected_height))
                if (expected_width, expected_height) != (width, height) =>
            {
                Err(GuardError::FrameSizeMismatch {
                    width,
                    height,
                    expected_width,
                    expected_height,
                })
            }
            Some(_) => Ok(()),
            None => {
                debug!(width, height, "session frame size fixed");
                self.frame_size = Some((width, height));
                Ok(())
            }
        }
    }

    fn ensure_proximity(&mut self, width: u32, height: u32) -> Result<&mut ProximityEvaluator> {
        if self.proximity.is_none() {
            let zone = self
                .configured_zone
                .clone()
                .unwrap_or_else(|| HazardZone::default_for_frame(width, height));
            info!(?zone, "hazard zone resolved from frame size");
            self.proximity = Some(ProximityEvaluator::new(zone, self.smoothing_window)?);
        }
        self.proximity
            .as_mut()
            .ok_or_else(|| GuardError::invalid_config("hazard zone unavailable"))
    }

    fn perceive(&mut self, frame: &RgbImage) -> Perception {
        match self.try_perceive(frame) {
            Ok(perception) => {
                if perception.status != FrameStatus::Detected {
                    self.reset_smoothing();
                }
                perception
            }
            Err(err) => {
                warn!(error = %err, "skipping malformed frame");
                self.reset_smoothing();
                Perception::skipped()
            }
        }
    }

    fn try_perceive(&mut self, frame: &RgbImage) -> Result<Perception> {
        self.check_frame(frame)?;
        let (width, height) = frame.dimensions();
        // The zone exists from the first valid frame on, hand or not
        self.ensure_proximity(width, height)?;

        let frame = if self.mirror {
            Cow::Owned(image::imageops::flip_horizontal(frame))
        } else {
            Cow::Borrowed(frame)
        };

        let mask = self.segmenter.segment(&frame)?;
        let refined = self.refiner.refine(&mask)?;
        let blobs = self.contour_extractor.extract(&refined)?;
        let blob_count = blobs.len();

        let Some(candidate) = self.selector.select(blobs, (width, height)) else {
            debug!(blob_count, "no hand detected");
            return Ok(Perception::no_hand());
        };

        let hull = self.hull_builder.build(&candidate.boundary);
        let proximity = self.ensure_proximity(width, height)?.evaluate(&hull);
        debug!(
            blob_count,
            area = candidate.area,
            hull_vertices = hull.len(),
            distance = proximity.map(|p| p.distance),
            "hand measured"
        );

        Ok(match proximity {
            Some(proximity) => Perception {
                status: FrameStatus::Detected,
                hull: Some(hull),
                proximity: Some(proximity),
            },
            None => Perception::no_hand(),
        })
    }

    fn finish(&mut self, perception: Perception, update: AlertUpdate) -> FrameResult {
        let sequence = self.alerts.last_sequence().unwrap_or_default();
        let result = FrameResult {
            sequence,
            status: perception.status,
            hull: perception.hull,
            distance: perception.proximity.map(|p| p.distance),
            hand_point: perception.proximity.map(|p| p.hand_point),
            zone_point: perception.proximity.map(|p| p.zone_point),
            level: update.level,
            transitioned: update.transitioned(),
        };

        let zone = self.proximity.as_ref().map(|p| p.zone());
        for sink in self.sinks.iter_mut() {
            if let Err(err) = sink.publish(&result, zone) {
                warn!(error = %err, sequence, "result sink failed");
            }
        }

        result
    }
}
