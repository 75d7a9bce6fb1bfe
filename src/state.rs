//! Application state management for stratus.
//!
//! This module defines the shared state that is passed to all handlers:
//! the configuration, the upstream service clients, and the session store
//! holding the live layer specifications.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::colorbar::ColorbarRenderer;
use crate::config::Config;
use crate::error::{Result, StratusError};
use crate::layer::{apply_layer_event, LayerEvent, LayerRole, LayerSpec};
use crate::services::{MapImageryService, TimeMetadataService};
use crate::time_link::{link_times, times_linkable};

/// One raster layer plus an optional isoline comparand and their link flag.
#[derive(Debug, Clone, Serialize)]
pub struct LayerSession {
    pub id: Uuid,
    pub raster: LayerSpec,
    pub isoline: Option<LayerSpec>,
    /// Whether the isoline's time selection tracks the raster's
    pub linked: bool,
}

impl LayerSession {
    pub fn new(raster: LayerSpec, isoline: Option<LayerSpec>) -> Self {
        Self {
            id: Uuid::new_v4(),
            raster,
            isoline,
            linked: false,
        }
    }

    pub fn layer(&self, role: LayerRole) -> Result<&LayerSpec> {
        match role {
            LayerRole::Raster => Ok(&self.raster),
            LayerRole::Isoline => self.isoline.as_ref().ok_or_else(|| {
                StratusError::InvalidParameter {
                    param: "role".to_string(),
                    message: "Session has no isoline layer".to_string(),
                }
            }),
        }
    }

    pub fn layer_mut(&mut self, role: LayerRole) -> Result<&mut LayerSpec> {
        match role {
            LayerRole::Raster => Ok(&mut self.raster),
            LayerRole::Isoline => self.isoline.as_mut().ok_or_else(|| {
                StratusError::InvalidParameter {
                    param: "role".to_string(),
                    message: "Session has no isoline layer".to_string(),
                }
            }),
        }
    }

    /// Whether the two layers' time selections are compatible for linking.
    pub fn times_linkable(&self) -> bool {
        match (&self.raster.times, self.isoline.as_ref().and_then(|i| i.times.as_ref())) {
            (Some(raster), Some(isoline)) => times_linkable(raster, isoline),
            _ => false,
        }
    }

    /// Apply one layer event, propagating a linked raster time change onto
    /// the isoline within the same update.
    pub fn apply_event(&mut self, role: LayerRole, event: LayerEvent) -> Result<()> {
        let follow = match (&event, role) {
            (LayerEvent::TimeChanged { time_key }, LayerRole::Raster) if self.linked => {
                let target = self
                    .isoline
                    .as_ref()
                    .and_then(|iso| link_times(true, *time_key, iso.times.as_ref()));
                target
            }
            // Isoline-initiated changes never propagate back.
            _ => None,
        };

        let dataset_changed = matches!(event, LayerEvent::DatasetChanged { .. });

        apply_layer_event(self.layer_mut(role)?, event)?;

        if let Some(time_key) = follow {
            if let Some(isoline) = self.isoline.as_mut() {
                apply_layer_event(isoline, LayerEvent::TimeChanged { time_key })?;
            }
        }

        // A dataset swap can leave the two time sets incompatible; an active
        // link must not outlive its structural precondition.
        if dataset_changed && self.linked && !self.times_linkable() {
            self.linked = false;
        }

        Ok(())
    }

    /// Toggle time-linking.
    ///
    /// Enabling performs a one-shot synchronization of the isoline to the
    /// raster's current key, not merely future propagation.
    pub fn set_linked(&mut self, linked: bool) -> Result<()> {
        if linked && !self.times_linkable() {
            return Err(StratusError::InvalidParameter {
                param: "linked".to_string(),
                message: "Time selections of the two variables are not compatible".to_string(),
            });
        }

        self.linked = linked;

        if linked {
            if let Some(time_key) = self.raster.time_key {
                let target = self
                    .isoline
                    .as_ref()
                    .and_then(|iso| link_times(true, time_key, iso.times.as_ref()));
                if let (Some(time_key), Some(isoline)) = (target, self.isoline.as_mut()) {
                    apply_layer_event(isoline, LayerEvent::TimeChanged { time_key })?;
                }
            }
        }

        Ok(())
    }
}

/// Store of live sessions.
///
/// Every mutation passes through `update` under the write lock, which
/// serializes competing state transitions (a user time change racing an
/// autoscale range response cannot lose either update).
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<Uuid, LayerSession>>,
}

impl SessionStore {
    pub fn insert(&self, session: LayerSession) -> Uuid {
        let id = session.id;
        self.inner.write().insert(id, session);
        id
    }

    /// Snapshot of one session.
    pub fn get(&self, id: &Uuid) -> Result<LayerSession> {
        self.inner
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StratusError::SessionNotFound { id: id.to_string() })
    }

    /// Apply a mutation to one session under the write lock.
    pub fn update<T>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut LayerSession) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = self.inner.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StratusError::SessionNotFound { id: id.to_string() })?;
        f(session)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// The main application state shared across all handlers
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Time-metadata service client
    pub metadata: Arc<dyn TimeMetadataService>,
    /// Map imagery service client
    pub imagery: Arc<dyn MapImageryService>,
    /// Live sessions
    pub sessions: SessionStore,
    /// Legend renderer bound to the imagery service
    pub colorbar: ColorbarRenderer,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        config: Config,
        metadata: Arc<dyn TimeMetadataService>,
        imagery: Arc<dyn MapImageryService>,
    ) -> Self {
        let colorbar = ColorbarRenderer::new(imagery.clone(), config.colorbar.clone());
        Self {
            config,
            metadata,
            imagery,
            sessions: SessionStore::default(),
            colorbar,
        }
    }

    /// Create a new AppState wrapped in an Arc for shared ownership
    pub fn new_shared(
        config: Config,
        metadata: Arc<dyn TimeMetadataService>,
        imagery: Arc<dyn MapImageryService>,
    ) -> Arc<Self> {
        Arc::new(Self::new(config, metadata, imagery))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timekey::{TimeKey, TimeMap, Timescale};
    use chrono::{TimeZone, Utc};

    fn times(timescale: Timescale, n: u32) -> TimeMap {
        (0..n)
            .map(|idx| {
                (
                    TimeKey::new(timescale, idx).unwrap(),
                    Utc.with_ymd_and_hms(1985, idx + 1, 15, 0, 0, 0).unwrap(),
                )
            })
            .collect()
    }

    fn resolved_layer(variable: &str, timescale: Timescale, n: u32) -> LayerSpec {
        let mut spec = LayerSpec::new(variable, "x-Occam");
        apply_layer_event(
            &mut spec,
            LayerEvent::DatasetChanged {
                dataset: format!("{}_ds", variable),
                variable_id: variable.to_string(),
                times: times(timescale, n),
                default_key: Some(TimeKey::new(timescale, 0).unwrap()),
            },
        )
        .unwrap();
        spec
    }

    fn dual_session() -> LayerSession {
        LayerSession::new(
            resolved_layer("tasmax", Timescale::Monthly, 12),
            Some(resolved_layer("pr", Timescale::Monthly, 12)),
        )
    }

    #[test]
    fn test_linked_time_change_propagates() {
        let mut session = dual_session();
        session.set_linked(true).unwrap();

        let key = TimeKey::new(Timescale::Monthly, 5).unwrap();
        session
            .apply_event(LayerRole::Raster, LayerEvent::TimeChanged { time_key: key })
            .unwrap();

        assert_eq!(session.raster.time_key, Some(key));
        assert_eq!(session.isoline.as_ref().unwrap().time_key, Some(key));
    }

    #[test]
    fn test_unlinked_time_change_stays_local() {
        let mut session = dual_session();

        let key = TimeKey::new(Timescale::Monthly, 5).unwrap();
        session
            .apply_event(LayerRole::Raster, LayerEvent::TimeChanged { time_key: key })
            .unwrap();

        assert_eq!(session.raster.time_key, Some(key));
        assert_eq!(
            session.isoline.as_ref().unwrap().time_key,
            Some(TimeKey::new(Timescale::Monthly, 0).unwrap())
        );
    }

    #[test]
    fn test_isoline_time_change_never_propagates_back() {
        let mut session = dual_session();
        session.set_linked(true).unwrap();

        let key = TimeKey::new(Timescale::Monthly, 7).unwrap();
        session
            .apply_event(LayerRole::Isoline, LayerEvent::TimeChanged { time_key: key })
            .unwrap();

        assert_eq!(session.isoline.as_ref().unwrap().time_key, Some(key));
        assert_eq!(
            session.raster.time_key,
            Some(TimeKey::new(Timescale::Monthly, 0).unwrap())
        );
    }

    #[test]
    fn test_enabling_link_syncs_once() {
        let mut session = dual_session();

        let key = TimeKey::new(Timescale::Monthly, 3).unwrap();
        session
            .apply_event(LayerRole::Raster, LayerEvent::TimeChanged { time_key: key })
            .unwrap();
        assert_ne!(session.isoline.as_ref().unwrap().time_key, Some(key));

        session.set_linked(true).unwrap();
        assert_eq!(session.isoline.as_ref().unwrap().time_key, Some(key));
    }

    #[test]
    fn test_dataset_change_drops_incompatible_link() {
        let mut session = dual_session();
        session.set_linked(true).unwrap();

        // The isoline moves to a seasonal-only instance: the monthly raster
        // keys no longer have counterparts.
        session
            .apply_event(
                LayerRole::Isoline,
                LayerEvent::DatasetChanged {
                    dataset: "pr_seasonal_ds".to_string(),
                    variable_id: "pr".to_string(),
                    times: times(Timescale::Seasonal, 4),
                    default_key: Some(TimeKey::new(Timescale::Seasonal, 0).unwrap()),
                },
            )
            .unwrap();

        assert!(!session.times_linkable());
        assert!(!session.linked);
    }

    #[test]
    fn test_link_refused_when_incompatible() {
        let mut session = LayerSession::new(
            resolved_layer("tasmax", Timescale::Monthly, 12),
            Some(resolved_layer("pr", Timescale::Seasonal, 4)),
        );

        assert!(!session.times_linkable());
        assert!(session.set_linked(false).is_ok());
        assert!(session.set_linked(true).is_err());
        assert!(!session.linked);
    }

    #[test]
    fn test_link_requires_isoline_layer() {
        let mut session =
            LayerSession::new(resolved_layer("tasmax", Timescale::Monthly, 12), None);

        assert!(!session.times_linkable());
        assert!(session.set_linked(true).is_err());
    }

    #[test]
    fn test_store_update_rejects_unknown_session() {
        let store = SessionStore::default();
        let missing = Uuid::new_v4();
        assert!(store.get(&missing).is_err());
        assert!(store.update(&missing, |_| Ok(())).is_err());
    }

    #[test]
    fn test_store_roundtrip() {
        let store = SessionStore::default();
        let id = store.insert(dual_session());

        assert_eq!(store.len(), 1);
        let snapshot = store.get(&id).unwrap();
        assert_eq!(snapshot.id, id);

        store
            .update(&id, |session| session.set_linked(true))
            .unwrap();
        assert!(store.get(&id).unwrap().linked);
    }
}
