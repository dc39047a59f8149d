use image::GrayImage;
use imageproc::{distance_transform::Norm, morphology};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::{
    error::{GuardError, Result},
    traits::MaskRefiner,
};

/// Opening followed by an optional closing, both with a square kernel.
///
/// Opening erodes `open_iterations` times and dilates the same number of
/// times, so any region that cannot hold the opened kernel disappears and
/// everything else keeps its shape. Closing (dilate then erode
/// `close_iterations` times) fills holes and notches narrower than the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MorphologyRefiner {
    /// Side length of the square structuring element; even sizes round down
    pub kernel_size: u8,
    pub open_iterations: u8,
    pub close_iterations: u8,
}

impl Default for MorphologyRefiner {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            open_iterations: 1,
            close_iterations: 1,
        }
    }
}

impl MorphologyRefiner {
    pub fn new(kernel_size: u8, open_iterations: u8, close_iterations: u8) -> Result<Self> {
        let refiner = Self {
            kernel_size,
            open_iterations,
            close_iterations,
        };
        refiner.validate()?;
        Ok(refiner)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kernel_size == 0 {
            return Err(GuardError::invalid_config("kernel size must be positive"));
        }
        Ok(())
    }

    /// Chebyshev radius of the kernel
    fn radius(&self) -> u8 {
        self.kernel_size / 2
    }

    /// Smallest square blob (side length in pixels) that survives the opening
    pub fn min_surviving_side(&self) -> u32 {
        2 * self.radius() as u32 * self.open_iterations as u32 + 1
    }

    fn erode_n(&self, mask: &mut GrayImage, iterations: u8) {
        for _ in 0..iterations {
            morphology::erode_mut(mask, Norm::LInf, self.radius());
        }
    }

    fn dilate_n(&self, mask: &mut GrayImage, iterations: u8) {
        for _ in 0..iterations {
            morphology::dilate_mut(mask, Norm::LInf, self.radius());
        }
    }
}

impl MaskRefiner for MorphologyRefiner {
    fn refine(&self, mask: &GrayImage) -> Result<GrayImage> {
        self.validate()?;
        let mut refined = mask.clone();
        if self.radius() == 0 {
            return Ok(refined);
        }

        self.erode_n(&mut refined, self.open_iterations);
        self.dilate_n(&mut refined, self.open_iterations);

        self.dilate_n(&mut refined, self.close_iterations);
        self.erode_n(&mut refined, self.close_iterations);

        Ok(refined)
    }
}
