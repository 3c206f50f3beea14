//! Update-loop coordinator
//!
//! `HeatmapSession` owns the grid engine and the recompute policy. Location
//! events and camera moves are handled synchronously, one at a time; the
//! render loop only reads `visible_cells()`.

use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::algorithms::{initial_bearing_deg, EmitterDistance, OriginMode};
use crate::api::formatting::{CellReport, EmitterReport, WindowSnapshot};
use crate::api::types::{SessionStatus, UpdateOutcome};
use crate::core::{GeoPoint, LocalPoint};
use crate::location::{FallbackAction, LocationError, LocationProvider, LocationSample};
use crate::processing::{CacheStats, CellQuery, GridCell, GridEngine, RecomputeMark, RecomputePolicy};
use crate::utils::config::HeatmapConfig;
use crate::validation::{validate_fix, GridError, GridResult};

pub struct HeatmapSession {
    config: HeatmapConfig,
    engine: GridEngine,
    policy: Box<dyn RecomputePolicy>,
    status: SessionStatus,
    /// A real or fallback fix has anchored the frame
    anchored: bool,
    user_position: Option<GeoPoint>,
    /// Last fix delivered by a provider; the default-location fallback never lands here
    last_fix: Option<GeoPoint>,
    /// Renderer-side user position in the mapper's frame
    user_local: LocalPoint,
    heading_deg: Option<f64>,
    last_mark: Option<RecomputeMark>,
    last_event_ms: u64,
    visible: Vec<Rc<GridCell>>,
}

impl HeatmapSession {
    /// Build a session. The frame sits on the default location until a fix arrives.
    pub fn new(config: HeatmapConfig) -> GridResult<Self> {
        let engine = config.build_engine(config.location.default_location)?;
        let policy = config.update.build();
        debug!(policy = policy.name(), "session created");

        Ok(Self {
            config,
            engine,
            policy,
            status: SessionStatus::AwaitingFix,
            anchored: false,
            user_position: None,
            last_fix: None,
            user_local: LocalPoint::origin(),
            heading_deg: None,
            last_mark: None,
            last_event_ms: 0,
            visible: Vec::new(),
        })
    }

    /// Replace the configured policy
    pub fn with_policy(mut self, policy: Box<dyn RecomputePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    pub fn engine(&self) -> &GridEngine {
        &self.engine
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Latest accepted fix
    pub fn user_position(&self) -> Option<GeoPoint> {
        self.user_position
    }

    pub fn user_local(&self) -> LocalPoint {
        self.user_local
    }

    /// Bearing between the last two distinct provider fixes
    pub fn heading_deg(&self) -> Option<f64> {
        self.heading_deg
    }

    /// The list the renderer draws. Only changes on a rebuild.
    pub fn visible_cells(&self) -> &[Rc<GridCell>] {
        &self.visible
    }

    pub fn last_recompute(&self) -> Option<&RecomputeMark> {
        self.last_mark.as_ref()
    }

    /// Handle one location fix from any provider
    pub fn on_location(&mut self, sample: &LocationSample, now_ms: u64) -> GridResult<UpdateOutcome> {
        let checked = validate_fix(&sample.point)
            .and_then(|_| sample.validate().map_err(GridError::from));
        if let Err(error) = checked {
            warn!(%error, source = ?sample.source, "location fix rejected");
            return Err(error);
        }

        self.apply_fix(sample.point)?;
        if let Some(previous) = self.last_fix {
            if previous != sample.point {
                self.heading_deg = Some(initial_bearing_deg(&previous, &sample.point));
            }
        }
        self.last_fix = Some(sample.point);
        self.status = SessionStatus::Tracking { source: sample.source };
        debug!(
            latitude = sample.point.latitude,
            longitude = sample.point.longitude,
            accuracy_m = sample.accuracy_m,
            source = ?sample.source,
            "location update"
        );
        self.refresh(now_ms, false)
    }

    /// Handle a provider failure
    pub fn on_location_error(&mut self, error: &LocationError, now_ms: u64) -> GridResult<UpdateOutcome> {
        match error.fallback_action() {
            FallbackAction::UseDefaultLocation if !self.anchored => {
                let fallback = self.config.location.default_location;
                info!(
                    %error,
                    latitude = fallback.latitude,
                    longitude = fallback.longitude,
                    "no location available, using default location"
                );
                self.apply_fix(fallback)?;
                self.status = SessionStatus::Fallback { reason: error.clone() };
                return self.refresh(now_ms, true);
            }
            FallbackAction::DiscardSample => {
                warn!(%error, "location sample discarded");
            }
            _ => {
                warn!(%error, "location provider error, keeping last fix");
                if self.status.is_tracking() {
                    self.status = SessionStatus::Degraded { last_error: error.clone() };
                }
            }
        }
        Ok(self.outcome(false))
    }

    /// The renderer moved the user (camera walk, keyboard input)
    pub fn on_camera_moved(&mut self, local: LocalPoint, now_ms: u64) -> GridResult<UpdateOutcome> {
        self.engine.user_grid_index(&local)?;
        self.user_local = local;
        self.refresh(now_ms, false)
    }

    /// Drain every pending event from `provider`
    pub fn pump<P: LocationProvider + ?Sized>(
        &mut self,
        provider: &mut P,
        now_ms: u64,
    ) -> GridResult<UpdateOutcome> {
        let mut outcome = self.outcome(false);
        loop {
            match provider.poll() {
                Ok(None) => break,
                Ok(Some(sample)) => {
                    let update = match self.on_location(&sample, now_ms) {
                        Ok(update) => update,
                        Err(error) if error.is_input_error() => continue,
                        Err(error) => return Err(error),
                    };
                    outcome.recomputed |= update.recomputed;
                }
                Err(error) => {
                    let update = self.on_location_error(&error, now_ms)?;
                    outcome.recomputed |= update.recomputed;
                    if !error.is_transient() {
                        break;
                    }
                }
            }
        }
        outcome.visible_cells = self.visible.len();
        outcome.cached_cells = self.engine.cache_len();
        Ok(outcome)
    }

    /// Rebuild the visible list regardless of the policy
    pub fn force_refresh(&mut self, now_ms: u64) -> GridResult<UpdateOutcome> {
        self.refresh(now_ms, true)
    }

    pub fn query_cell(&mut self, latitude: f64, longitude: f64) -> GridResult<CellQuery> {
        self.engine.query_cell(latitude, longitude)
    }

    pub fn compute_visible_cells(&mut self, local: &LocalPoint) -> GridResult<Vec<Rc<GridCell>>> {
        self.engine.compute_visible_cells(local)
    }

    pub fn geo_to_local(&self, latitude: f64, longitude: f64) -> LocalPoint {
        self.engine.geo_to_local(latitude, longitude)
    }

    pub fn local_to_geo(&self, local: &LocalPoint) -> GeoPoint {
        self.engine.local_to_geo(local)
    }

    /// Geographic position of the renderer-side user
    pub fn user_geo(&self) -> GeoPoint {
        self.engine.local_to_geo(&self.user_local).normalized()
    }

    /// Emitters within the configured marker radius of the user
    pub fn visible_emitters(&self) -> Vec<EmitterDistance<'_>> {
        let radius_deg = self
            .engine
            .mapper()
            .scale()
            .km_to_degrees(self.config.location.emitter_visible_radius_km);
        self.engine.model().emitters_within(&self.user_geo(), radius_deg)
    }

    pub fn nearest_emitter(&self) -> Option<EmitterDistance<'_>> {
        self.engine.model().nearest_emitter(&self.user_geo())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.engine.cache_stats()
    }

    /// Debug overlay contents for the current frame
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            timestamp_ms: self.last_event_ms,
            status: self.status.label().to_string(),
            user: self.user_geo(),
            user_local: self.user_local,
            heading_deg: self.heading_deg,
            cells: self.visible.iter().map(|cell| CellReport::from_cell(cell)).collect(),
            cache: self.engine.cache_stats(),
            nearest_emitter: self.nearest_emitter().as_ref().map(EmitterReport::from_distance),
            visible_emitters: self
                .visible_emitters()
                .iter()
                .map(EmitterReport::from_distance)
                .collect(),
        }
    }

    fn apply_fix(&mut self, point: GeoPoint) -> GridResult<()> {
        if !self.anchored {
            self.engine.reset_frame(point)?;
            self.user_local = LocalPoint::origin();
            self.anchored = true;
        } else {
            self.engine.observe_user_position(point)?;
            if self.engine.mapper().mode() == OriginMode::FixedAnchor {
                self.user_local = self.engine.geo_to_local(point.latitude, point.longitude);
            }
        }

        self.user_position = Some(point);
        Ok(())
    }

    fn refresh(&mut self, now_ms: u64, force: bool) -> GridResult<UpdateOutcome> {
        self.last_event_ms = now_ms;
        let user = self.engine.local_to_geo(&self.user_local);
        let current = self.engine.grid_frame_position(&user);

        let due = self.policy.should_recompute(self.last_mark.as_ref(), now_ms, &current);
        if !(force || due) {
            return Ok(self.outcome(false));
        }

        self.visible = self.engine.compute_visible_cells(&self.user_local)?;
        let mark = RecomputeMark {
            timestamp_ms: now_ms,
            position: current,
        };
        self.policy.on_recomputed(&mark);
        self.last_mark = Some(mark);

        Ok(self.outcome(true))
    }

    fn outcome(&self, recomputed: bool) -> UpdateOutcome {
        UpdateOutcome {
            recomputed,
            visible_cells: self.visible.len(),
            cached_cells: self.engine.cache_len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationSource, ScriptedLocationProvider};
    use crate::processing::{AlwaysRecompute, IntervalPolicy, PolicyConfig};

    fn config(mode: OriginMode, update: PolicyConfig) -> HeatmapConfig {
        let mut config = HeatmapConfig::default();
        config.frame.origin_mode = mode;
        config.update = update;
        config
    }

    fn fix(latitude: f64, longitude: f64, timestamp_ms: u64) -> LocationSample {
        LocationSample::new(GeoPoint::new(latitude, longitude), 5.0, timestamp_ms, LocationSource::Device)
    }

    #[test]
    fn test_new_session_waits_for_fix() {
        let session = HeatmapSession::new(HeatmapConfig::default()).unwrap();
        assert_eq!(session.status(), &SessionStatus::AwaitingFix);
        assert!(session.visible_cells().is_empty());
        assert!(session.user_position().is_none());
        assert_eq!(session.engine().grid_center(), GeoPoint::new(25.0330, 121.5654));
    }

    #[test]
    fn test_first_fix_anchors_and_fills_window() {
        let mut session = HeatmapSession::new(config(OriginMode::FixedAnchor, PolicyConfig::default())).unwrap();
        let outcome = session.on_location(&fix(25.04, 121.55, 0), 0).unwrap();

        assert!(outcome.recomputed);
        assert_eq!(outcome.visible_cells, 49);
        assert_eq!(outcome.cached_cells, 49);
        assert_eq!(session.engine().grid_center(), GeoPoint::new(25.04, 121.55));
        assert_eq!(session.engine().mapper().origin(), GeoPoint::new(25.04, 121.55));
        assert_eq!(session.status(), &SessionStatus::Tracking { source: LocationSource::Device });
        assert_eq!(session.user_local(), LocalPoint::origin());
    }

    #[test]
    fn test_fixed_anchor_moves_user_not_origin() {
        let mut session = HeatmapSession::new(config(OriginMode::FixedAnchor, PolicyConfig::Always)).unwrap();
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();
        session.on_location(&fix(25.009, 121.5, 1000), 1000).unwrap();

        assert_eq!(session.engine().mapper().origin(), GeoPoint::new(25.0, 121.5));
        let local = session.user_local();
        assert!(local.x.abs() < 1e-9);
        assert!((local.z + 100.0).abs() < 1e-9);
        let heading = session.heading_deg().unwrap();
        assert!(heading < 0.01 || heading > 359.99);
    }

    #[test]
    fn test_user_following_moves_origin() {
        let mut session = HeatmapSession::new(config(OriginMode::UserFollowing, PolicyConfig::Always)).unwrap();
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();
        session.on_camera_moved(LocalPoint::new(0.0, -1.0), 10).unwrap();
        session.on_location(&fix(25.002, 121.5, 1000), 1000).unwrap();

        assert_eq!(session.engine().mapper().origin(), GeoPoint::new(25.002, 121.5));
        assert_eq!(session.user_local(), LocalPoint::new(0.0, -1.0));
        // lattice alignment stays at the first fix
        assert_eq!(session.engine().grid_center(), GeoPoint::new(25.0, 121.5));
    }

    #[test]
    fn test_revisit_returns_same_cells() {
        let mut session = HeatmapSession::new(config(OriginMode::FixedAnchor, PolicyConfig::Always)).unwrap();
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();
        let first: Vec<_> = session.visible_cells().to_vec();

        session.on_location(&fix(25.01, 121.51, 1000), 1000).unwrap();
        session.on_location(&fix(25.0, 121.5, 2000), 2000).unwrap();

        for (a, b) in first.iter().zip(session.visible_cells()) {
            assert!(Rc::ptr_eq(a, b));
        }
        assert_eq!(session.cache_stats().cells, 98);
    }

    #[test]
    fn test_throttled_updates_keep_previous_window() {
        let mut session = HeatmapSession::new(HeatmapConfig::default())
            .unwrap()
            .with_policy(Box::new(IntervalPolicy { min_interval_ms: 300 }));
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();
        let before = session.visible_cells()[0].clone();

        let outcome = session.on_location(&fix(25.01, 121.5, 100), 100).unwrap();
        assert!(!outcome.recomputed);
        assert!(Rc::ptr_eq(&before, &session.visible_cells()[0]));

        let outcome = session.on_location(&fix(25.01, 121.5, 350), 350).unwrap();
        assert!(outcome.recomputed);
        assert!(!Rc::ptr_eq(&before, &session.visible_cells()[0]));
    }

    #[test]
    fn test_camera_walk_accumulates() {
        let update = PolicyConfig::AccumulatedDistance { threshold: 3.0 };
        let mut session = HeatmapSession::new(config(OriginMode::FixedAnchor, update)).unwrap();
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();

        assert!(!session.on_camera_moved(LocalPoint::new(1.2, 0.0), 16).unwrap().recomputed);
        assert!(!session.on_camera_moved(LocalPoint::new(2.4, 0.0), 32).unwrap().recomputed);
        assert!(session.on_camera_moved(LocalPoint::new(3.6, 0.0), 48).unwrap().recomputed);
        assert!(!session.on_camera_moved(LocalPoint::new(4.0, 0.0), 64).unwrap().recomputed);
    }

    #[test]
    fn test_invalid_fix_leaves_state_untouched() {
        let mut session = HeatmapSession::new(HeatmapConfig::default()).unwrap();
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();
        let cached = session.cache_stats().cells;

        assert!(session.on_location(&fix(f64::NAN, 121.5, 10), 10).is_err());
        assert!(session.on_location(&fix(100.0, 121.5, 10), 10).is_err());
        assert!(session.on_camera_moved(LocalPoint::new(f64::INFINITY, 0.0), 10).is_err());

        assert_eq!(session.user_position(), Some(GeoPoint::new(25.0, 121.5)));
        assert_eq!(session.cache_stats().cells, cached);
    }

    #[test]
    fn test_permission_denied_falls_back_to_default() {
        let mut session = HeatmapSession::new(HeatmapConfig::default()).unwrap();
        let outcome = session
            .on_location_error(&LocationError::PermissionDenied, 0)
            .unwrap();

        assert!(outcome.recomputed);
        assert_eq!(outcome.visible_cells, 49);
        assert_eq!(session.user_position(), Some(GeoPoint::new(25.0330, 121.5654)));
        assert_eq!(
            session.status(),
            &SessionStatus::Fallback { reason: LocationError::PermissionDenied }
        );

        // a real fix later takes over without re-anchoring the lattice
        session.on_location(&fix(25.0331, 121.5655, 1000), 1000).unwrap();
        assert!(session.status().is_tracking());
        assert_eq!(session.engine().grid_center(), GeoPoint::new(25.0330, 121.5654));
    }

    #[test]
    fn test_fallback_does_not_seed_heading() {
        let mut session = HeatmapSession::new(config(OriginMode::FixedAnchor, PolicyConfig::Always)).unwrap();
        session.on_location_error(&LocationError::PermissionDenied, 0).unwrap();
        assert!(session.heading_deg().is_none());

        session.on_location(&fix(24.0, 120.0, 1000), 1000).unwrap();
        assert!(session.heading_deg().is_none());

        session.on_location(&fix(24.0, 120.001, 2000), 2000).unwrap();
        let heading = session.heading_deg().unwrap();
        assert!((heading - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_sample_accuracy_checked() {
        let mut session = HeatmapSession::new(HeatmapConfig::default()).unwrap();
        let mut sample = fix(25.0, 121.5, 0);
        sample.accuracy_m = f64::NAN;
        let err = session.on_location(&sample, 0).unwrap_err();
        assert!(matches!(err, GridError::Location(LocationError::InvalidFix { .. })));
        assert!(err.is_input_error());

        sample.accuracy_m = -3.0;
        assert!(session.on_location(&sample, 0).is_err());
        assert!(session.user_position().is_none());
        assert_eq!(session.status(), &SessionStatus::AwaitingFix);
    }

    #[test]
    fn test_far_camera_move_rejected() {
        let mut session = HeatmapSession::new(config(OriginMode::FixedAnchor, PolicyConfig::Always)).unwrap();
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();

        assert!(session.on_camera_moved(LocalPoint::new(1e22, 0.0), 10).is_err());
        assert_eq!(session.user_local(), LocalPoint::origin());
        assert!(session.force_refresh(20).unwrap().recomputed);
    }

    #[test]
    fn test_error_while_tracking_degrades() {
        let mut session = HeatmapSession::new(HeatmapConfig::default()).unwrap();
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();
        let outcome = session
            .on_location_error(&LocationError::Timeout { timeout_ms: 5000 }, 100)
            .unwrap();
        assert!(!outcome.recomputed);
        assert_eq!(outcome.visible_cells, 49);
        assert!(matches!(session.status(), SessionStatus::Degraded { .. }));
        assert_eq!(session.user_position(), Some(GeoPoint::new(25.0, 121.5)));
    }

    #[test]
    fn test_pump_scripted_provider() {
        let mut provider =
            ScriptedLocationProvider::with_walk(LocationSource::Device, (25.0, 121.5), (0.0005, 0.0), 4, 1000);
        provider.push_fix(fix(f64::NAN, 0.0, 5000));
        provider.push_error(LocationError::Timeout { timeout_ms: 5000 });

        let mut session = HeatmapSession::new(config(OriginMode::FixedAnchor, PolicyConfig::Always)).unwrap();
        let outcome = session.pump(&mut provider, 0).unwrap();

        assert!(outcome.recomputed);
        assert_eq!(outcome.visible_cells, 49);
        assert_eq!(provider.remaining(), 0);
        assert!((session.user_position().unwrap().latitude - 25.0015).abs() < 1e-12);
        assert!(matches!(session.status(), SessionStatus::Degraded { .. }));
    }

    #[test]
    fn test_query_and_transforms_passthrough() {
        let mut session = HeatmapSession::new(HeatmapConfig::default())
            .unwrap()
            .with_policy(Box::new(AlwaysRecompute));
        session.on_location(&fix(25.0, 121.5, 0), 0).unwrap();

        let local = session.geo_to_local(25.009, 121.5);
        assert!((local.z + 100.0).abs() < 1e-9);
        let back = session.local_to_geo(&local);
        assert!((back.latitude - 25.009).abs() < 1e-12);

        // the user's own cell is already cached by the window
        assert!(session.query_cell(25.0, 121.5).unwrap().cache_hit);
        assert!(!session.query_cell(25.5, 121.5).unwrap().cache_hit);
        assert_eq!(session.compute_visible_cells(&LocalPoint::origin()).unwrap().len(), 49);
    }

    #[test]
    fn test_emitter_reports_and_snapshot() {
        let mut session = HeatmapSession::new(config(OriginMode::FixedAnchor, PolicyConfig::Always)).unwrap();
        session.on_location(&fix(25.0330, 121.5654, 0), 0).unwrap();

        let nearest = session.nearest_emitter().unwrap();
        assert_eq!(nearest.emitter.name, "Taipei 101");
        assert!(session.visible_emitters().iter().any(|e| e.emitter.name == "Nangang"));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.cells.len(), 49);
        assert_eq!(snapshot.status, "gps");
        assert_eq!(snapshot.nearest_emitter.unwrap().distance_m, 0.0);
    }
}
