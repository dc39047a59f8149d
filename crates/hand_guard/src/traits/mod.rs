use image::{GrayImage, RgbImage};
use crate::{
    error::Result,
    types::{Blob, FrameResult, HazardZone, Hull},
};

/// Trait for turning a color frame into a binary foreground mask
pub trait ColorSegmenter: Send + Sync {
    /// Produce a mask (0 = background, 255 = foreground) of the frame's size
    fn segment(&self, frame: &RgbImage) -> Result<GrayImage>;
}

/// Trait for morphological mask cleanup
pub trait MaskRefiner: Send + Sync {
    /// Remove speckle noise and close small gaps
    fn refine(&self, mask: &GrayImage) -> Result<GrayImage>;
}

/// Trait for finding connected foreground regions
pub trait ContourExtractor: Send + Sync {
    /// Extract every outer region of a binary mask
    fn extract(&self, mask: &GrayImage) -> Result<Vec<Blob>>;
}

/// Trait for convex hull construction
pub trait HullBuilder: Send + Sync {
    /// Build the convex hull of a point set; degenerate input is returned as-is
    fn build(&self, points: &[[f32; 2]]) -> Hull;
}

/// Supplier of frames, e.g. a camera or a directory of stills
pub trait FrameSource: Send {
    /// `None` ends the stream; `Some(Err(_))` is a failed acquisition
    fn next_frame(&mut self) -> Option<Result<RgbImage>>;
}

/// Consumer of per-frame results, e.g. an overlay renderer or a logger
pub trait ResultSink: Send {
    /// `zone` is `None` until the session zone is known (first valid frame)
    fn publish(&mut self, result: &FrameResult, zone: Option<&HazardZone>) -> Result<()>;
}
