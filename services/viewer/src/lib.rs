//! Headless host for the climate map engine.
//!
//! Wires configuration, the API client, the base-map overlay and a
//! [`map_view::MapView`] into a [`session::Session`] that the CLI drives.

pub mod config;
pub mod replay;
pub mod session;

pub use config::ViewerConfig;
pub use replay::{ReplayReport, ReplayScript, ReplayStep, Replayer};
pub use session::{fetch_layer, ChatOutcome, LoadStatus, LoadTicket, Session, SessionError};

use std::sync::Arc;

use anyhow::{Context, Result};
use climate_client::{ApiClient, HttpBorderSource};
use map_view::{BaseMapOverlay, MapView};
use renderer::TextRenderer;

/// Build a map view from configuration, attaching the label font if set.
pub fn build_view(config: &ViewerConfig, overlay: BaseMapOverlay) -> Result<MapView> {
    let mut view = MapView::new(config.map.clone())
        .context("Invalid map configuration")?
        .with_overlay(overlay);
    if let Some(font) = &config.overlay.font {
        let text = TextRenderer::load(font)
            .with_context(|| format!("Failed to load label font: {}", font.display()))?;
        view = view.with_text(text);
    }
    Ok(view)
}

/// Border source for the configured overlay paths.
pub fn border_source(config: &ViewerConfig, client: ApiClient) -> Arc<HttpBorderSource> {
    Arc::new(HttpBorderSource::new(client).with_paths(
        &config.overlay.coarse_borders,
        &config.overlay.fine_borders,
        &config.overlay.labels,
    ))
}
