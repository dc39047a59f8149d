use crate::{
    alert::AlertStateMachine,
    algorithms::{BlobSelector, GeoHullBuilder, HsvSegmenter, ImageprocContourExtractor},
    config::GuardConfig,
    error::Result,
    pipeline::FrameOrchestrator,
    traits::{ColorSegmenter, ContourExtractor, HullBuilder, MaskRefiner, ResultSink},
};

/// Builder for creating frame orchestrators with a fluent API
pub struct OrchestratorBuilder {
    config: GuardConfig,
    segmenter: Option<Box<dyn ColorSegmenter>>,
    refiner: Option<Box<dyn MaskRefiner>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    hull_builder: Option<Box<dyn HullBuilder>>,
    sinks: Vec<Box<dyn ResultSink>>,
}

impl OrchestratorBuilder {
    /// Create a new builder using the default configuration
    pub fn new() -> Self {
        Self {
            config: GuardConfig::default(),
            segmenter: None,
            refiner: None,
            contour_extractor: None,
            hull_builder: None,
            sinks: Vec::new(),
        }
    }

    /// Use this configuration for thresholds, zone and default stages
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the color segmenter (replaces the configured HSV segmenter)
    pub fn set_segmenter<S>(mut self, segmenter: S) -> Self
    where
        S: ColorSegmenter + 'static,
    {
        self.segmenter = Some(Box::new(segmenter));
        self
    }

    /// Set the mask refiner (replaces the configured morphology)
    pub fn set_refiner<R>(mut self, refiner: R) -> Self
    where
        R: MaskRefiner + 'static,
    {
        self.refiner = Some(Box::new(refiner));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the hull builder (replaces any existing one)
    pub fn set_hull_builder<H>(mut self, hull_builder: H) -> Self
    where
        H: HullBuilder + 'static,
    {
        self.hull_builder = Some(Box::new(hull_builder));
        self
    }

    /// Add a result sink; every processed frame is published to each sink
    pub fn add_sink<S>(mut self, sink: S) -> Self
    where
        S: ResultSink + 'static,
    {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Validate the configuration and build the orchestrator, filling in
    /// default stages from the configuration where none were set
    pub fn build(self) -> Result<FrameOrchestrator> {
        let config = self.config;
        config.validate()?;

        let segmenter = self
            .segmenter
            .unwrap_or_else(|| Box::new(HsvSegmenter::new(config.color_range, config.blur_sigma)));
        let refiner = self
            .refiner
            .unwrap_or_else(|| Box::new(config.morphology.clone()));
        let contour_extractor = self
            .contour_extractor
            .unwrap_or_else(|| Box::new(ImageprocContourExtractor));
        let hull_builder = self
            .hull_builder
            .unwrap_or_else(|| Box::new(GeoHullBuilder::default()));

        FrameOrchestrator::new(
            segmenter,
            refiner,
            contour_extractor,
            BlobSelector::new(config.min_blob_area),
            hull_builder,
            config.hazard_zone,
            config.smoothing_window,
            AlertStateMachine::new(config.alert)?,
            config.frame_size.map(|size| (size.width, size.height)),
            config.mirror,
            self.sinks,
        )
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
