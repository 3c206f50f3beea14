//! Policies deciding when the visible window is rebuilt
//!
//! Throttling only bounds how often the renderer receives a new cell list.
//! The cache itself is always consistent, whatever the policy decides.

use serde::{Deserialize, Serialize};

use crate::core::{LocalPoint, DEFAULT_MIN_INTERVAL_MS, DEFAULT_MOVE_THRESHOLD_UNITS};

/// Time and position of the last window rebuild
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecomputeMark {
    pub timestamp_ms: u64,
    /// User position in grid-frame local units
    pub position: LocalPoint,
}

/// Strategy injected into the update loop.
///
/// `last` is `None` until the first rebuild; every policy rebuilds then.
pub trait RecomputePolicy {
    fn should_recompute(
        &mut self,
        last: Option<&RecomputeMark>,
        now_ms: u64,
        current: &LocalPoint,
    ) -> bool;

    /// Called after the window was rebuilt
    fn on_recomputed(&mut self, _mark: &RecomputeMark) {}

    fn name(&self) -> &'static str;
}

/// Rebuild on every observation
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRecompute;

impl RecomputePolicy for AlwaysRecompute {
    fn should_recompute(&mut self, _last: Option<&RecomputeMark>, _now_ms: u64, _current: &LocalPoint) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "always"
    }
}

/// Rebuild at most once per `min_interval_ms`
#[derive(Debug, Clone, Copy)]
pub struct IntervalPolicy {
    pub min_interval_ms: u64,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

impl RecomputePolicy for IntervalPolicy {
    fn should_recompute(&mut self, last: Option<&RecomputeMark>, now_ms: u64, _current: &LocalPoint) -> bool {
        match last {
            None => true,
            Some(mark) => now_ms.saturating_sub(mark.timestamp_ms) >= self.min_interval_ms,
        }
    }

    fn name(&self) -> &'static str {
        "interval"
    }
}

/// Rebuild once the user is `min_distance` units away from the last rebuild
#[derive(Debug, Clone, Copy)]
pub struct DisplacementPolicy {
    pub min_distance: f64,
}

impl RecomputePolicy for DisplacementPolicy {
    fn should_recompute(&mut self, last: Option<&RecomputeMark>, _now_ms: u64, current: &LocalPoint) -> bool {
        match last {
            None => true,
            Some(mark) => mark.position.distance_to(current) >= self.min_distance,
        }
    }

    fn name(&self) -> &'static str {
        "displacement"
    }
}

/// Rebuild once the path walked since the last rebuild reaches `threshold`.
///
/// Unlike `DisplacementPolicy`, pacing back and forth still counts.
#[derive(Debug, Clone, Copy)]
pub struct AccumulatedDistancePolicy {
    threshold: f64,
    accumulated: f64,
    last_seen: Option<LocalPoint>,
}

impl Default for AccumulatedDistancePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_THRESHOLD_UNITS)
    }
}

impl AccumulatedDistancePolicy {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            accumulated: 0.0,
            last_seen: None,
        }
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }
}

impl RecomputePolicy for AccumulatedDistancePolicy {
    fn should_recompute(&mut self, last: Option<&RecomputeMark>, _now_ms: u64, current: &LocalPoint) -> bool {
        let Some(mark) = last else {
            return true;
        };

        let previous = self.last_seen.unwrap_or(mark.position);
        self.accumulated += previous.distance_to(current);
        self.last_seen = Some(*current);
        self.accumulated >= self.threshold
    }

    fn on_recomputed(&mut self, mark: &RecomputeMark) {
        self.accumulated = 0.0;
        self.last_seen = Some(mark.position);
    }

    fn name(&self) -> &'static str {
        "accumulated-distance"
    }
}

/// Rebuild when any member policy asks for it.
///
/// Every member is consulted on every call so stateful members keep
/// accumulating.
pub struct AnyOf {
    policies: Vec<Box<dyn RecomputePolicy>>,
}

impl AnyOf {
    pub fn new(policies: Vec<Box<dyn RecomputePolicy>>) -> Self {
        Self { policies }
    }
}

impl RecomputePolicy for AnyOf {
    fn should_recompute(&mut self, last: Option<&RecomputeMark>, now_ms: u64, current: &LocalPoint) -> bool {
        self.policies
            .iter_mut()
            .fold(false, |fire, policy| policy.should_recompute(last, now_ms, current) || fire)
    }

    fn on_recomputed(&mut self, mark: &RecomputeMark) {
        for policy in &mut self.policies {
            policy.on_recomputed(mark);
        }
    }

    fn name(&self) -> &'static str {
        "any-of"
    }
}

/// Serializable description of a policy, as found in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    Always,
    Interval { min_interval_ms: u64 },
    Displacement { min_distance: f64 },
    AccumulatedDistance { threshold: f64 },
    AnyOf { policies: Vec<PolicyConfig> },
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::AnyOf {
            policies: vec![
                PolicyConfig::AccumulatedDistance {
                    threshold: DEFAULT_MOVE_THRESHOLD_UNITS,
                },
                PolicyConfig::Interval {
                    min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
                },
            ],
        }
    }
}

impl PolicyConfig {
    pub fn build(&self) -> Box<dyn RecomputePolicy> {
        match self {
            PolicyConfig::Always => Box::new(AlwaysRecompute),
            PolicyConfig::Interval { min_interval_ms } => Box::new(IntervalPolicy {
                min_interval_ms: *min_interval_ms,
            }),
            PolicyConfig::Displacement { min_distance } => Box::new(DisplacementPolicy {
                min_distance: *min_distance,
            }),
            PolicyConfig::AccumulatedDistance { threshold } => {
                Box::new(AccumulatedDistancePolicy::new(*threshold))
            }
            PolicyConfig::AnyOf { policies } => {
                Box::new(AnyOf::new(policies.iter().map(PolicyConfig::build).collect()))
            }
        }
    }

    /// First offending parameter, if any
    pub fn invalid_parameter(&self) -> Option<(&'static str, String)> {
        match self {
            PolicyConfig::Always | PolicyConfig::Interval { .. } => None,
            PolicyConfig::Displacement { min_distance } => {
                (!min_distance.is_finite() || *min_distance < 0.0)
                    .then(|| ("update.min_distance", min_distance.to_string()))
            }
            PolicyConfig::AccumulatedDistance { threshold } => {
                (!threshold.is_finite() || *threshold < 0.0)
                    .then(|| ("update.threshold", threshold.to_string()))
            }
            PolicyConfig::AnyOf { policies } => policies.iter().find_map(PolicyConfig::invalid_parameter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(timestamp_ms: u64, x: f64, z: f64) -> RecomputeMark {
        RecomputeMark {
            timestamp_ms,
            position: LocalPoint::new(x, z),
        }
    }

    #[test]
    fn test_first_observation_always_fires() {
        let here = LocalPoint::origin();
        assert!(IntervalPolicy::default().should_recompute(None, 0, &here));
        assert!(DisplacementPolicy { min_distance: 10.0 }.should_recompute(None, 0, &here));
        assert!(AccumulatedDistancePolicy::default().should_recompute(None, 0, &here));
        assert!(AlwaysRecompute.should_recompute(None, 0, &here));
    }

    #[test]
    fn test_interval_policy() {
        let mut policy = IntervalPolicy { min_interval_ms: 300 };
        let last = mark(1_000, 0.0, 0.0);
        let here = LocalPoint::origin();
        assert!(!policy.should_recompute(Some(&last), 1_299, &here));
        assert!(policy.should_recompute(Some(&last), 1_300, &here));
        // clock going backwards never fires
        assert!(!policy.should_recompute(Some(&last), 500, &here));
    }

    #[test]
    fn test_displacement_policy() {
        let mut policy = DisplacementPolicy { min_distance: 5.0 };
        let last = mark(0, 0.0, 0.0);
        assert!(!policy.should_recompute(Some(&last), 0, &LocalPoint::new(3.0, 3.9)));
        assert!(policy.should_recompute(Some(&last), 0, &LocalPoint::new(3.0, 4.0)));
    }

    #[test]
    fn test_accumulated_distance_counts_pacing() {
        let mut policy = AccumulatedDistancePolicy::new(3.0);
        let last = mark(0, 0.0, 0.0);
        policy.on_recomputed(&last);

        assert!(!policy.should_recompute(Some(&last), 0, &LocalPoint::new(1.0, 0.0)));
        assert!(!policy.should_recompute(Some(&last), 0, &LocalPoint::new(0.0, 0.0)));
        assert!((policy.accumulated() - 2.0).abs() < 1e-12);
        assert!(policy.should_recompute(Some(&last), 0, &LocalPoint::new(1.0, 0.0)));

        policy.on_recomputed(&mark(0, 1.0, 0.0));
        assert_eq!(policy.accumulated(), 0.0);
        assert!(!policy.should_recompute(Some(&last), 0, &LocalPoint::new(2.0, 0.0)));
    }

    #[test]
    fn test_any_of_keeps_members_accumulating() {
        let mut policy = AnyOf::new(vec![
            Box::new(IntervalPolicy { min_interval_ms: 1_000 }),
            Box::new(AccumulatedDistancePolicy::new(3.0)),
        ]);
        let last = mark(0, 0.0, 0.0);
        policy.on_recomputed(&last);

        assert!(!policy.should_recompute(Some(&last), 100, &LocalPoint::new(2.0, 0.0)));
        assert!(policy.should_recompute(Some(&last), 200, &LocalPoint::new(3.5, 0.0)));
        assert!(policy.should_recompute(Some(&last), 1_000, &LocalPoint::new(3.5, 0.0)));
    }

    #[test]
    fn test_policy_config_round_trip() {
        let config = PolicyConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"any_of\""));
        let parsed: PolicyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.build().name(), "any-of");
    }

    #[test]
    fn test_policy_config_validation() {
        assert!(PolicyConfig::default().invalid_parameter().is_none());
        let bad = PolicyConfig::AnyOf {
            policies: vec![
                PolicyConfig::Always,
                PolicyConfig::Displacement { min_distance: -1.0 },
            ],
        };
        assert_eq!(bad.invalid_parameter().map(|(name, _)| name), Some("update.min_distance"));
    }
}
