//! Three-level proximity alert with a missed-frame grace period.
//!
//! The machine is fed one [`Observation`] per frame. Distances map directly
//! to a level (contact always wins); frames without a detection hold the
//! current level for `grace_frames` frames and then decay to `decay_level`.
//! Transitions are reported edge-triggered, the current level is always
//! available through [`AlertStateMachine::level`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::{GuardError, Result},
    types::AlertLevel,
};

/// What a frame contributed to the alert decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Hull-to-zone distance; 0 means contact
    Distance(f32),
    /// No hand this frame (nothing found, malformed frame, or no frame at all)
    NoDetection,
}

/// Thresholds and hysteresis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AlertPolicy {
    /// Distances below this raise WARNING, at or above it are SAFE
    pub warning_threshold: f32,
    /// Distances at or below this are contact (DANGER)
    pub danger_distance: f32,
    /// Consecutive missed frames during which the previous level is held
    pub grace_frames: u32,
    /// Level assumed once the grace period runs out
    pub decay_level: AlertLevel,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            warning_threshold: 150.0,
            danger_distance: 0.0,
            grace_frames: 5,
            decay_level: AlertLevel::Safe,
        }
    }
}

impl AlertPolicy {
    pub fn validate(&self) -> Result<()> {
        if !(self.warning_threshold > 0.0) || !self.warning_threshold.is_finite() {
            return Err(GuardError::invalid_config(format!(
                "warning threshold must be positive and finite, got {}",
                self.warning_threshold
            )));
        }
        if !(self.danger_distance >= 0.0) || self.danger_distance >= self.warning_threshold {
            return Err(GuardError::invalid_config(format!(
                "danger distance must lie in [0, {}), got {}",
                self.warning_threshold, self.danger_distance
            )));
        }
        Ok(())
    }

    /// Level for a measured distance, ignoring history.
    ///
    /// Negative or NaN distances are treated as contact.
    pub fn classify(&self, distance: f32) -> AlertLevel {
        if !(distance > self.danger_distance) {
            AlertLevel::Danger
        } else if distance < self.warning_threshold {
            AlertLevel::Warning
        } else {
            AlertLevel::Safe
        }
    }
}

/// Edge-triggered level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: AlertLevel,
    pub to: AlertLevel,
    /// Sequence number of the frame that caused it
    pub sequence: u64,
}

/// Outcome of feeding one observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertUpdate {
    pub level: AlertLevel,
    pub previous: AlertLevel,
    pub transition: Option<Transition>,
}

impl AlertUpdate {
    pub fn transitioned(&self) -> bool {
        self.transition.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AlertStateMachine {
    policy: AlertPolicy,
    level: AlertLevel,
    missed_frames: u32,
    last_sequence: Option<u64>,
}

impl AlertStateMachine {
    pub fn new(policy: AlertPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            level: AlertLevel::Safe,
            missed_frames: 0,
            last_sequence: None,
        })
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Current level (level-triggered query)
    pub fn level(&self) -> AlertLevel {
        self.level
    }

    /// Consecutive frames without a detection
    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }

    /// Sequence number of the most recently applied observation
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Apply the observation of the frame following the last applied one
    pub fn update(&mut self, observation: Observation) -> AlertUpdate {
        let sequence = self.last_sequence.map_or(0, |last| last.saturating_add(1));
        self.apply(sequence, observation)
    }

    /// Apply an observation tagged with its frame sequence number.
    ///
    /// Only strictly newer frames may advance the machine; anything older
    /// than or equal to the last applied frame is rejected untouched.
    pub fn update_sequenced(&mut self, sequence: u64, observation: Observation) -> Result<AlertUpdate> {
        if let Some(last_applied) = self.last_sequence {
            if sequence <= last_applied {
                return Err(GuardError::StaleFrame {
                    sequence,
                    last_applied,
                });
            }
        }
        Ok(self.apply(sequence, observation))
    }

    fn apply(&mut self, sequence: u64, observation: Observation) -> AlertUpdate {
        self.last_sequence = Some(sequence);
        let previous = self.level;

        let next = match observation {
            Observation::Distance(distance) => {
                self.missed_frames = 0;
                self.policy.classify(distance)
            }
            Observation::NoDetection => {
                self.missed_frames = self.missed_frames.saturating_add(1);
                if self.missed_frames > self.policy.grace_frames {
                    self.policy.decay_level
                } else {
                    previous
                }
            }
        };

        self.level = next;
        let transition = (next != previous).then(|| {
            match next {
                AlertLevel::Safe => info!(sequence, from = %previous, to = %next, "alert cleared"),
                _ => warn!(sequence, from = %previous, to = %next, "alert raised"),
            }
            Transition {
                from: previous,
                to: next,
                sequence,
            }
        });

        AlertUpdate {
            level: next,
            previous,
            transition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(grace_frames: u32) -> AlertStateMachine {
        AlertStateMachine::new(AlertPolicy {
            grace_frames,
            ..AlertPolicy::default()
        })
        .unwrap()
    }

    #[test]
    fn test_classify_thresholds() {
        let policy = AlertPolicy::default();
        assert_eq!(policy.classify(0.0), AlertLevel::Danger);
        assert_eq!(policy.classify(-3.0), AlertLevel::Danger);
        assert_eq!(policy.classify(f32::NAN), AlertLevel::Danger);
        assert_eq!(policy.classify(0.5), AlertLevel::Warning);
        assert_eq!(policy.classify(80.0), AlertLevel::Warning);
        assert_eq!(policy.classify(149.9), AlertLevel::Warning);
        assert_eq!(policy.classify(150.0), AlertLevel::Safe);
        assert_eq!(policy.classify(310.0), AlertLevel::Safe);
    }

    #[test]
    fn test_contact_tolerance() {
        let policy = AlertPolicy {
            danger_distance: 10.0,
            ..AlertPolicy::default()
        };
        assert_eq!(policy.classify(10.0), AlertLevel::Danger);
        assert_eq!(policy.classify(10.5), AlertLevel::Warning);
    }

    #[test]
    fn test_contact_always_wins() {
        for start in [0.0, 80.0, 500.0] {
            let mut sm = machine(3);
            sm.update(Observation::Distance(start));
            let update = sm.update(Observation::Distance(0.0));
            assert_eq!(update.level, AlertLevel::Danger);
        }
    }

    #[test]
    fn test_transitions_are_edge_triggered() {
        let mut sm = machine(0);

        let first = sm.update(Observation::Distance(80.0));
        assert_eq!(
            first.transition,
            Some(Transition {
                from: AlertLevel::Safe,
                to: AlertLevel::Warning,
                sequence: 0
            })
        );

        let repeat = sm.update(Observation::Distance(60.0));
        assert_eq!(repeat.level, AlertLevel::Warning);
        assert!(!repeat.transitioned());

        let contact = sm.update(Observation::Distance(0.0));
        assert_eq!(contact.previous, AlertLevel::Warning);
        assert_eq!(contact.transition.map(|t| t.to), Some(AlertLevel::Danger));
        assert_eq!(sm.level(), AlertLevel::Danger);
    }

    #[test]
    fn test_single_dropout_holds_level() {
        let mut sm = machine(1);
        sm.update(Observation::Distance(0.0));
        let update = sm.update(Observation::NoDetection);
        assert_eq!(update.level, AlertLevel::Danger);
        assert!(!update.transitioned());
        sm.update(Observation::Distance(0.0));
        assert_eq!(sm.missed_frames(), 0);
    }

    #[test]
    fn test_grace_period_then_decay() {
        let mut sm = machine(5);
        sm.update(Observation::Distance(80.0));

        for frame in 1..=10 {
            let update = sm.update(Observation::NoDetection);
            if frame <= 5 {
                assert_eq!(update.level, AlertLevel::Warning, "frame {frame}");
                assert!(!update.transitioned());
            } else {
                assert_eq!(update.level, AlertLevel::Safe, "frame {frame}");
                assert_eq!(update.transitioned(), frame == 6);
            }
        }
    }

    #[test]
    fn test_zero_grace_decays_immediately() {
        let mut sm = machine(0);
        sm.update(Observation::Distance(0.0));
        let update = sm.update(Observation::NoDetection);
        assert_eq!(update.level, AlertLevel::Safe);
        assert!(update.transitioned());
    }

    #[test]
    fn test_configurable_decay_level() {
        let mut sm = AlertStateMachine::new(AlertPolicy {
            grace_frames: 0,
            decay_level: AlertLevel::Warning,
            ..AlertPolicy::default()
        })
        .unwrap();
        sm.update(Observation::Distance(0.0));
        assert_eq!(sm.update(Observation::NoDetection).level, AlertLevel::Warning);
    }

    #[test]
    fn test_stale_sequences_are_rejected() {
        let mut sm = machine(2);
        sm.update_sequenced(4, Observation::Distance(80.0)).unwrap();

        let stale = sm.update_sequenced(3, Observation::Distance(0.0));
        assert!(matches!(
            stale,
            Err(GuardError::StaleFrame {
                sequence: 3,
                last_applied: 4
            })
        ));
        assert!(sm.update_sequenced(4, Observation::Distance(0.0)).is_err());
        assert_eq!(sm.level(), AlertLevel::Warning);

        let fresh = sm.update_sequenced(7, Observation::Distance(0.0)).unwrap();
        assert_eq!(fresh.transition.map(|t| t.sequence), Some(7));
        assert_eq!(sm.update(Observation::Distance(500.0)).transition.map(|t| t.sequence), Some(8));
    }

    #[test]
    fn test_sequence_saturates_at_max() {
        let mut sm = machine(2);
        sm.update_sequenced(u64::MAX, Observation::Distance(80.0)).unwrap();
        let update = sm.update(Observation::NoDetection);
        assert_eq!(update.level, AlertLevel::Warning);
        assert_eq!(sm.last_sequence(), Some(u64::MAX));
    }

    #[test]
    fn test_invalid_policies() {
        let zero_threshold = AlertPolicy {
            warning_threshold: 0.0,
            ..AlertPolicy::default()
        };
        assert!(AlertStateMachine::new(zero_threshold).is_err());

        let inverted = AlertPolicy {
            danger_distance: 200.0,
            ..AlertPolicy::default()
        };
        assert!(inverted.validate().is_err());

        let negative = AlertPolicy {
            danger_distance: -1.0,
            ..AlertPolicy::default()
        };
        assert!(negative.validate().is_err());
    }
}
