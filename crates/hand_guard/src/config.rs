use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    alert::AlertPolicy,
    algorithms::MorphologyRefiner,
    error::{GuardError, Result},
    types::{ColorRange, HazardZone},
};

/// Fixed frame dimensions for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Session configuration, loaded once before the first frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GuardConfig {
    /// HSV bounds of the hand color
    pub color_range: ColorRange,
    /// Gaussian pre-blur sigma; 0 disables blurring
    #[schemars(range(min = 0.0))]
    pub blur_sigma: f32,
    /// Mask cleanup parameters
    pub morphology: MorphologyRefiner,
    /// A blob must cover more pixels than this to count as a hand
    pub min_blob_area: u32,
    /// Hazard zone in frame coordinates; derived from the first frame when absent
    pub hazard_zone: Option<HazardZone>,
    /// Distance thresholds and missed-frame policy
    pub alert: AlertPolicy,
    /// Moving-average window over distances; 1 disables smoothing
    #[schemars(range(min = 1))]
    pub smoothing_window: usize,
    /// Flip frames horizontally before processing (selfie-style cameras)
    pub mirror: bool,
    /// Expected frame size; taken from the first valid frame when absent
    pub frame_size: Option<FrameSize>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            color_range: ColorRange::default(),
            blur_sigma: 2.0,
            morphology: MorphologyRefiner::default(),
            min_blob_area: 3000,
            hazard_zone: None,
            alert: AlertPolicy::default(),
            smoothing_window: 1,
            mirror: false,
            frame_size: None,
        }
    }
}

impl GuardConfig {
    /// Get the JSON schema of the configuration
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(GuardConfig)
    }

    /// Reject configurations that would make per-frame behavior undefined
    pub fn validate(&self) -> Result<()> {
        self.color_range.validate()?;

        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(GuardError::invalid_config(format!(
                "blur sigma must be finite and non-negative, got {}",
                self.blur_sigma
            )));
        }

        self.morphology.validate()?;

        if let Some(zone) = &self.hazard_zone {
            zone.validate()?;
        }

        self.alert.validate()?;

        if self.smoothing_window == 0 {
            return Err(GuardError::invalid_config("smoothing window must be at least 1"));
        }

        if let Some(size) = self.frame_size {
            if size.width == 0 || size.height == 0 {
                return Err(GuardError::invalid_config(format!(
                    "frame size must be non-zero, got {}x{}",
                    size.width, size.height
                )));
            }
        }

        Ok(())
    }

    /// The configured zone, or the default zone for a frame of this size
    pub fn resolve_zone(&self, width: u32, height: u32) -> HazardZone {
        self.hazard_zone
            .clone()
            .unwrap_or_else(|| HazardZone::default_for_frame(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hsv;

    #[test]
    fn test_default_config_is_valid() {
        GuardConfig::default().validate().expect("defaults must validate");
    }

    #[test]
    fn test_rejects_each_invalid_setting() {
        let cases: Vec<(&str, GuardConfig)> = vec![
            ("zero-area zone", GuardConfig {
                hazard_zone: Some(HazardZone::rectangle(10.0, 10.0, 0.0, 50.0)),
                ..GuardConfig::default()
            }),
            ("inverted value range", GuardConfig {
                color_range: ColorRange { lower: Hsv::new(0, 0, 200), upper: Hsv::new(20, 255, 100) },
                ..GuardConfig::default()
            }),
            ("zero kernel", GuardConfig {
                morphology: MorphologyRefiner { kernel_size: 0, ..MorphologyRefiner::default() },
                ..GuardConfig::default()
            }),
            ("negative blur", GuardConfig { blur_sigma: -1.0, ..GuardConfig::default() }),
            ("zero window", GuardConfig { smoothing_window: 0, ..GuardConfig::default() }),
            ("zero threshold", GuardConfig {
                alert: AlertPolicy { warning_threshold: 0.0, ..AlertPolicy::default() },
                ..GuardConfig::default()
            }),
            ("empty frame size", GuardConfig {
                frame_size: Some(FrameSize { width: 0, height: 480 }),
                ..GuardConfig::default()
            }),
        ];

        for (name, config) in cases {
            assert!(
                matches!(config.validate(), Err(GuardError::InvalidConfig(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_json_round_trip_with_partial_input() {
        let json = r#"{
            "min_blob_area": 1500,
            "hazard_zone": { "type": "rectangle", "x": 400, "y": 200, "width": 100, "height": 100 },
            "alert": { "grace_frames": 3 }
        }"#;
        let config: GuardConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.min_blob_area, 1500);
        assert_eq!(config.alert.grace_frames, 3);
        assert_eq!(config.alert.warning_threshold, 150.0);
        assert_eq!(config.morphology, MorphologyRefiner::default());
        assert_eq!(
            config.hazard_zone,
            Some(HazardZone::rectangle(400.0, 200.0, 100.0, 100.0))
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_resolve_zone_falls_back_to_frame_default() {
        let config = GuardConfig::default();
        assert_eq!(
            config.resolve_zone(640, 480),
            HazardZone::rectangle(416.0, 120.0, 200.0, 200.0)
        );
    }

    #[test]
    fn test_schema_lists_fields() {
        let schema = serde_json::to_value(GuardConfig::schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for field in ["color_range", "morphology", "hazard_zone", "alert", "smoothing_window"] {
            assert!(properties.contains_key(field), "missing {field}");
        }
    }
}
