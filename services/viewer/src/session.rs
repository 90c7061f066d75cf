//! Load orchestration: view state → requests → decoded grid → map layer.
//!
//! A load is split into three steps so overlapping loads can be resolved by
//! generation: [`Session::begin_load`] stamps a generation and captures the
//! requests, [`fetch_layer`] does the network and decode work, and
//! [`Session::finish_load`] applies the result only if it is still current.
//! Network failures keep the cached raster; an undecodable payload clears it.

use std::sync::Arc;

use chrono::NaiveDate;
use climate_client::{ClientError, ClimateApi, RequestGeneration};
use climate_common::{
    decode_grid, ChatMessage, ChatRequest, DataRequest, DecodedGrid, DisplayUnit, GridGeometry,
    PatchEffect, PatchError, StatePatch, ValueRange, ViewState, ViewerError,
};
use map_view::{MapView, RasterLayer};
use renderer::Palette;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("Chat request failed: {0}")]
    Chat(String),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Client(e) => e.user_message(),
            SessionError::Viewer(e) => e.user_message(),
            SessionError::Patch(e) => e.to_string(),
            SessionError::Chat(msg) => msg.clone(),
        }
    }

    /// The payload itself was unusable; the map shows no data rather than a stale raster.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            SessionError::Viewer(
                ViewerError::UnsupportedDtype(_)
                    | ViewerError::UnsupportedLonConvention(_)
                    | ViewerError::ShapeMismatch { .. }
                    | ViewerError::InvalidLatExtent { .. }
            )
        )
    }
}

/// User-visible state of the most recent load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading { generation: u64 },
    Ready { generation: u64 },
    /// The API answered without data; nothing is drawn
    NoData,
    /// The load was abandoned; the previous raster stays on screen
    Failed(String),
    /// A newer load started before this one finished
    Superseded { generation: u64 },
}

impl LoadStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadStatus::Ready { .. })
    }
}

/// What a load needs, captured at the moment it starts.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub requests: Vec<DataRequest>,
    pub difference: bool,
    pub palette: Palette,
    pub unit: DisplayUnit,
}

/// Result of a chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub reply: String,
    pub effect: PatchEffect,
    pub status: Option<LoadStatus>,
}

pub struct Session {
    api: Arc<dyn ClimateApi>,
    view: MapView,
    state: ViewState,
    generations: RequestGeneration,
    geometry: GridGeometry,
    diverging_palette: String,
    status: LoadStatus,
    history: Vec<ChatMessage>,
}

impl Session {
    pub fn new(api: Arc<dyn ClimateApi>, view: MapView, state: ViewState) -> Result<Self, SessionError> {
        let geometry = view.config().geometry()?;
        let diverging_palette = view.config().diverging_palette.clone();
        Ok(Self {
            api,
            view,
            state,
            generations: RequestGeneration::new(),
            geometry,
            diverging_palette,
            status: LoadStatus::Idle,
            history: Vec::new(),
        })
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut MapView {
        &mut self.view
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn api(&self) -> Arc<dyn ClimateApi> {
        self.api.clone()
    }

    /// Run one complete load cycle for the current state.
    pub async fn load(&mut self) -> LoadStatus {
        let ticket = match self.begin_load() {
            Ok(ticket) => ticket,
            Err(e) => {
                self.status = LoadStatus::Failed(e.user_message());
                return self.status.clone();
            }
        };
        let result = fetch_layer(self.api.as_ref(), &ticket, &self.geometry).await;
        self.finish_load(ticket.generation, result)
    }

    /// Stamp a new generation and capture the requests for the current state.
    pub fn begin_load(&mut self) -> Result<LoadTicket, SessionError> {
        let difference = self.state.is_difference();
        let palette_name = if difference {
            &self.diverging_palette
        } else {
            &self.state.palette
        };
        let palette = Palette::by_name(palette_name)?;
        let ticket = LoadTicket {
            generation: self.generations.next(),
            requests: self.state.requests(),
            difference,
            palette,
            unit: DisplayUnit::resolve(&self.state.variable, self.state.unit.as_deref()),
        };
        self.status = LoadStatus::Loading {
            generation: ticket.generation,
        };
        info!(
            generation = ticket.generation,
            variable = %self.state.variable,
            requests = ticket.requests.len(),
            difference,
            "Load started"
        );
        Ok(ticket)
    }

    /// Apply a fetched layer if its generation is still current.
    pub fn finish_load(
        &mut self,
        generation: u64,
        result: Result<Option<RasterLayer>, SessionError>,
    ) -> LoadStatus {
        if !self.generations.is_current(generation) {
            debug!(generation, current = self.generations.current(), "Discarding stale load");
            return LoadStatus::Superseded { generation };
        }

        self.status = match result {
            Ok(Some(layer)) => match self.view.set_layer(layer) {
                Ok(rendered) => {
                    info!(generation, rendered, "Load complete");
                    LoadStatus::Ready { generation }
                }
                Err(e) => {
                    warn!(error = %e, "Render failed");
                    LoadStatus::Failed(e.user_message())
                }
            },
            Ok(None) => {
                info!(generation, "No data for this selection");
                self.view.clear();
                LoadStatus::NoData
            }
            Err(e) => {
                warn!(generation, error = %e, "Load failed");
                if e.is_decode_error() {
                    self.view.clear();
                }
                LoadStatus::Failed(e.user_message())
            }
        };
        self.status.clone()
    }

    /// Apply validated patches, reloading or recoloring as required.
    pub async fn apply_patches(&mut self, patches: &[StatePatch]) -> Result<(PatchEffect, Option<LoadStatus>), SessionError> {
        let effect = self.state.apply_all(patches)?;
        if effect.reset_transform {
            self.view.reset_transform();
        }

        if effect.refetch {
            let status = self.load().await;
            return Ok((effect, Some(status)));
        }

        if self.view.layer().is_some() {
            let unit = DisplayUnit::resolve(&self.state.variable, self.state.unit.as_deref());
            self.view.set_unit(unit)?;
            if effect.rerender && !self.state.is_difference() {
                let palette = Palette::by_name(&self.state.palette)?;
                self.view.set_palette(palette)?;
            }
        }
        Ok((effect, None))
    }

    /// Commit a time-slider date.
    pub async fn set_date(&mut self, date: NaiveDate) -> Result<(PatchEffect, Option<LoadStatus>), SessionError> {
        self.apply_patches(&[StatePatch::Date(date)]).await
    }

    /// Send a chat message with the current state as context and apply the reply.
    #[instrument(skip(self, message))]
    pub async fn chat(&mut self, message: &str) -> Result<ChatOutcome, SessionError> {
        let request = ChatRequest {
            message: message.to_string(),
            context: Some(self.state.to_context()),
            history: self.history.clone(),
        };
        let response = self.api.chat(&request).await?;

        self.history.push(ChatMessage::user(message));
        self.history.push(ChatMessage::assistant(response.message.clone()));

        if !response.success {
            let reason = response.error.unwrap_or_else(|| response.message.clone());
            return Err(SessionError::Chat(reason));
        }

        let (effect, status) = match &response.new_state {
            Some(new_state) => {
                let patches = StatePatch::parse_all(new_state)?;
                debug!(patches = patches.len(), "Applying chat state patches");
                self.apply_patches(&patches).await?
            }
            None => (PatchEffect::default(), None),
        };

        Ok(ChatOutcome {
            reply: response.message,
            effect,
            status,
        })
    }
}

/// Fetch and decode every request of a ticket and combine them into a layer.
///
/// `Ok(None)` when any member came back without data.
pub async fn fetch_layer(
    api: &dyn ClimateApi,
    ticket: &LoadTicket,
    geometry: &GridGeometry,
) -> Result<Option<RasterLayer>, SessionError> {
    let mut grids = Vec::with_capacity(ticket.requests.len());
    for request in &ticket.requests {
        let payload = api.data(request).await?;
        match decode_grid(&payload, geometry)? {
            Some(grid) => grids.push(grid),
            None => return Ok(None),
        }
    }

    let grid = combine(grids, ticket.difference)?;
    let range = ValueRange::of_grid(&grid)?;
    let range = if ticket.difference {
        range.symmetric()
    } else {
        range
    };

    Ok(Some(RasterLayer {
        grid: Arc::new(grid),
        generation: ticket.generation,
        palette: ticket.palette.clone(),
        range,
        unit: ticket.unit.clone(),
        difference: ticket.difference,
    }))
}

fn combine(mut grids: Vec<DecodedGrid>, difference: bool) -> Result<DecodedGrid, ViewerError> {
    if difference {
        if grids.len() != 2 {
            return Err(ViewerError::IncompatibleGrids(format!(
                "a comparison needs two rasters, got {}",
                grids.len()
            )));
        }
        return grids[0].difference(&grids[1]);
    }
    match grids.len() {
        0 => Err(ViewerError::NoValidValues),
        1 => Ok(grids.remove(0)),
        _ => DecodedGrid::ensemble_mean(&grids),
    }
}
