use image::{GrayImage, Luma};
use imageproc::{
    contours::{find_contours, BorderType},
    region_labelling::{connected_components, Connectivity},
};
use tracing::trace;
use crate::{error::Result, traits::ContourExtractor, types::Blob};

/// Imageproc-based contour extractor.
///
/// Outer borders come from `find_contours`; pixel areas and centroids come
/// from an 8-connected labelling of the same mask.
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor;

#[derive(Debug, Clone, Copy, Default)]
struct RegionStats {
    count: u32,
    sum_x: u64,
    sum_y: u64,
}

impl ContourExtractor for ImageprocContourExtractor {
    fn extract(&self, mask: &GrayImage) -> Result<Vec<Blob>> {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

        let mut stats: Vec<RegionStats> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0] as usize;
            if label == 0 {
                continue;
            }
            if stats.len() <= label {
                stats.resize(label + 1, RegionStats::default());
            }
            let region = &mut stats[label];
            region.count += 1;
            region.sum_x += x as u64;
            region.sum_y += y as u64;
        }

        let blobs: Vec<Blob> = find_contours::<i32>(mask)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer)
            .filter_map(|contour| {
                let start = contour.points.first()?;
                let label = labels.get_pixel(start.x as u32, start.y as u32)[0] as usize;
                let region = stats.get(label).copied().filter(|r| r.count > 0)?;

                Some(Blob {
                    boundary: contour
                        .points
                        .iter()
                        .map(|p| [p.x as f32, p.y as f32])
                        .collect(),
                    area: region.count,
                    centroid: [
                        (region.sum_x as f64 / region.count as f64) as f32,
                        (region.sum_y as f64 / region.count as f64) as f32,
                    ],
                })
            })
            .collect();

        trace!(count = blobs.len(), "extracted blobs");
        Ok(blobs)
    }
}

/// Picks the candidate hand out of the extracted blobs
#[derive(Debug, Clone)]
pub struct BlobSelector {
    /// A blob must cover more pixels than this to count as a hand
    pub min_area: u32,
}

impl Default for BlobSelector {
    fn default() -> Self {
        Self { min_area: 3000 }
    }
}

impl BlobSelector {
    pub fn new(min_area: u32) -> Self {
        Self { min_area }
    }

    /// Largest qualifying blob, or `None` when no hand is present.
    ///
    /// Equal areas go to the blob whose centroid is nearest the frame
    /// center; remaining ties keep the earlier blob.
    pub fn select(&self, blobs: Vec<Blob>, frame_size: (u32, u32)) -> Option<Blob> {
        let center = [frame_size.0 as f32 / 2.0, frame_size.1 as f32 / 2.0];

        blobs
            .into_iter()
            .filter(|blob| blob.area > self.min_area)
            .fold(None, |best: Option<Blob>, blob| match best {
                None => Some(blob),
                Some(current) => {
                    let larger = blob.area > current.area;
                    let closer = blob.area == current.area
                        && blob.distance_to(center) < current.distance_to(center);
                    if larger || closer {
                        Some(blob)
                    } else {
                        Some(current)
                    }
                }
            })
    }
}
