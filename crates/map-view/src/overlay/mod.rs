//! Base-map overlay: border polylines and place labels.
//!
//! Overlay data is fetched once per process. Until it arrives frames are
//! drawn without it; when it lands the caller's redraw callback fires once.

pub mod borders;
pub mod labels;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use borders::{draw_borders, project_polyline, BorderSet, BorderStyle};
pub use labels::{draw_labels, max_labels, place_labels, Label, LabelBox, LabelSet, PlacedLabel};

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Failed to fetch {resource}: {reason}")]
    Fetch { resource: String, reason: String },

    #[error("Invalid overlay data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where overlay data comes from.
#[async_trait]
pub trait BorderSource: Send + Sync {
    async fn coarse_borders(&self) -> Result<BorderSet, OverlayError>;

    async fn fine_borders(&self) -> Result<BorderSet, OverlayError>;

    async fn labels(&self) -> Result<LabelSet, OverlayError>;
}

/// Everything the overlay draws.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayData {
    pub coarse: BorderSet,
    pub fine: BorderSet,
    pub labels: LabelSet,
}

impl OverlayData {
    /// Border set for a zoom level.
    pub fn borders_for(&self, zoom: f64, fine_threshold: f64) -> &BorderSet {
        if zoom >= fine_threshold && !self.fine.is_empty() {
            &self.fine
        } else {
            &self.coarse
        }
    }
}

/// Process-lifetime overlay cache. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct BaseMapOverlay {
    data: Arc<OnceLock<OverlayData>>,
    loading: Arc<AtomicBool>,
}

impl BaseMapOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&OverlayData> {
        self.data.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    /// Install data directly, e.g. from a local file. No-op once loaded.
    pub fn install(&self, data: OverlayData) -> bool {
        self.data.set(data).is_ok()
    }

    /// Fetch all three datasets and install them.
    ///
    /// Returns `Ok(true)` if this call populated the cache, `Ok(false)` when
    /// data was already present or another load is in flight.
    pub async fn load(&self, source: &dyn BorderSource) -> Result<bool, OverlayError> {
        if self.is_loaded() || self.loading.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }

        let result = async {
            let coarse = source.coarse_borders().await?;
            let fine = source.fine_borders().await?;
            let labels = source.labels().await?;
            Ok::<_, OverlayError>(OverlayData {
                coarse,
                fine,
                labels,
            })
        }
        .await;

        self.loading.store(false, Ordering::Release);
        let data = result?;
        info!(
            coarse = data.coarse.len(),
            fine = data.fine.len(),
            labels = data.labels.len(),
            "Base-map overlay loaded"
        );
        Ok(self.install(data))
    }

    /// Start loading in the background; `on_loaded` runs once on success.
    ///
    /// Failures are logged and leave the overlay empty so a later call can retry.
    pub fn spawn_load<S, F>(&self, source: Arc<S>, on_loaded: F) -> JoinHandle<()>
    where
        S: BorderSource + 'static,
        F: FnOnce() + Send + 'static,
    {
        let overlay = self.clone();
        tokio::spawn(async move {
            match overlay.load(&*source).await {
                Ok(true) => on_loaded(),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Base-map overlay unavailable, drawing without it"),
            }
        })
    }
}
