//! # Hand Guard
//!
//! Real-time hand proximity monitoring for a single fixed camera.
//! Each frame is segmented by skin color, cleaned up morphologically, reduced
//! to the largest hand-sized blob and its convex hull, and measured against a
//! static hazard zone. A three-level alert state machine (SAFE, WARNING,
//! DANGER) with a missed-frame grace period turns the distances into alerts.
//!
//! ## Core Features
//!
//! - **Trait-based stages**: swap segmentation, refinement, extraction or hull construction
//! - **Exact geometry**: polygon-to-polygon distances with the closest point pair
//! - **Hysteresis**: short detection dropouts do not clear an active alert
//! - **GeoJSON overlays**: export the zone, hull and closest-point segment per frame
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hand_guard::{FrameOrchestrator, GuardConfig, HazardZone};
//!
//! let config = GuardConfig {
//!     hazard_zone: Some(HazardZone::rectangle(400.0, 200.0, 100.0, 100.0)),
//!     ..GuardConfig::default()
//! };
//! let mut orchestrator = FrameOrchestrator::from_config(config)?;
//!
//! let frame = image::open("frame.png")?.to_rgb8();
//! let result = orchestrator.process(&frame);
//! println!("{} at {:?}px", result.level, result.distance);
//!
//! result.save_geojson(orchestrator.zone(), "overlay.geojson")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Stages
//!
//! ```rust,no_run
//! use hand_guard::{FrameOrchestrator, MorphologyRefiner, HsvSegmenter, ColorRange};
//!
//! let orchestrator = FrameOrchestrator::builder()
//!     .set_segmenter(HsvSegmenter::new(ColorRange::default(), 0.0))
//!     .set_refiner(MorphologyRefiner::new(7, 2, 1)?)
//!     .build()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod alert;
pub mod config;
pub mod pipeline;
pub mod io;

// Re-exports for convenience
pub use error::{GuardError, Result};
pub use types::*;
pub use traits::*;
pub use algorithms::*;
pub use alert::{AlertPolicy, AlertStateMachine, AlertUpdate, Observation, Transition};
pub use config::{FrameSize, GuardConfig};
pub use pipeline::{FrameOrchestrator, RunSummary, builder::OrchestratorBuilder};
