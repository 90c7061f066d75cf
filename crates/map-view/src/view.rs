//! The map view: sole owner of the cached raster, transform and drag state.
//!
//! Full renders build a new bitmap, lookup table and legend off to the side
//! and swap them in as one unit. Transform-only changes go through
//! [`MapView::redraw`], which only blits.

use std::sync::Arc;
use std::time::Instant;

use climate_common::{DecodedGrid, DisplayUnit, ValueRange, ViewerError, ViewerResult};
use metrics::{counter, histogram};
use projection::ScreenProjection;
use renderer::png::{encode_pixmap, PngResult};
use renderer::{render, Legend, Palette, RenderTarget, RenderedRaster, Rgb, TextRenderer};
use tiny_skia::Pixmap;
use tracing::{debug, info};

use crate::config::MapViewConfig;
use crate::events::{PointerEvent, PointerOutcome};
use crate::lookup::{lookup, tooltip_for, PointValue, TooltipUpdate, ValueDisplay};
use crate::overlay::{draw_borders, draw_labels, place_labels, BaseMapOverlay, BorderStyle};
use crate::redraw::draw_wrapped;
use crate::transform::{DragState, ViewportTransform};

/// A grid ready to be shown, with everything that decides its colors.
#[derive(Debug, Clone)]
pub struct RasterLayer {
    pub grid: Arc<DecodedGrid>,
    /// Bumped by the loader for every newly fetched grid
    pub generation: u64,
    pub palette: Palette,
    pub range: ValueRange,
    pub unit: DisplayUnit,
    /// Compare-mode difference field
    pub difference: bool,
}

impl RasterLayer {
    fn display(&self) -> ValueDisplay {
        ValueDisplay {
            unit: self.unit.clone(),
            range: self.range,
            difference: self.difference,
        }
    }
}

/// Everything the cached bitmap depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    generation: u64,
    palette: String,
    range: (u64, u64),
    projection: ScreenProjection,
    size: (u32, u32),
}

impl CacheKey {
    fn new(layer: &RasterLayer, projection: ScreenProjection, size: (u32, u32)) -> Self {
        Self {
            generation: layer.generation,
            palette: layer.palette.name().to_string(),
            range: (layer.range.min.to_bits(), layer.range.max.to_bits()),
            projection,
            size,
        }
    }
}

#[derive(Debug)]
struct RasterCache {
    key: CacheKey,
    raster: RenderedRaster,
    legend: Legend,
}

/// Render and redraw counters of this view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewStats {
    pub full_renders: u64,
    pub redraws: u64,
}

#[derive(Debug)]
pub struct MapView {
    config: MapViewConfig,
    transform: ViewportTransform,
    drag: DragState,
    layer: Option<RasterLayer>,
    cache: Option<RasterCache>,
    surface: Pixmap,
    overlay: BaseMapOverlay,
    text: Option<TextRenderer>,
    background: Rgb,
    border: Rgb,
    label: Rgb,
    stats: ViewStats,
}

impl MapView {
    pub fn new(config: MapViewConfig) -> ViewerResult<Self> {
        config.validate()?;
        let surface = new_surface(&config)?;
        Ok(Self {
            background: config.background_rgb()?,
            border: config.border_rgb()?,
            label: config.label_rgb()?,
            config,
            transform: ViewportTransform::default(),
            drag: DragState::Idle,
            layer: None,
            cache: None,
            surface,
            overlay: BaseMapOverlay::new(),
            text: None,
            stats: ViewStats::default(),
        })
    }

    pub fn with_overlay(mut self, overlay: BaseMapOverlay) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_text(mut self, text: TextRenderer) -> Self {
        self.text = Some(text);
        self
    }

    pub fn config(&self) -> &MapViewConfig {
        &self.config
    }

    pub fn overlay(&self) -> &BaseMapOverlay {
        &self.overlay
    }

    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn stats(&self) -> ViewStats {
        self.stats
    }

    pub fn layer(&self) -> Option<&RasterLayer> {
        self.layer.as_ref()
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.cache.as_ref().map(|c| &c.legend)
    }

    pub fn raster(&self) -> Option<&RenderedRaster> {
        self.cache.as_ref().map(|c| &c.raster)
    }

    /// The last composed frame.
    pub fn frame(&self) -> &Pixmap {
        &self.surface
    }

    /// World size in CSS pixels (the viewport at zoom 1).
    pub fn world_size(&self) -> (f64, f64) {
        (self.config.width as f64, self.config.height as f64)
    }

    /// Set the transform directly, clamping zoom and vertical pan.
    pub fn set_transform(&mut self, transform: ViewportTransform) {
        let (min, max) = self.config.zoom_bounds();
        self.transform = ViewportTransform {
            zoom: transform.zoom.clamp(min, max),
            ..transform
        };
        let (_, world_h) = self.world_size();
        self.transform.clamp_pan_y(world_h, world_h);
    }

    /// Back to zoom 1, no pan; used when the view mode changes shape.
    pub fn reset_transform(&mut self) {
        self.transform = ViewportTransform::default();
        self.drag = DragState::Idle;
    }

    /// Show a layer, re-rendering only if the bitmap's inputs changed.
    ///
    /// Returns whether a full render happened. On error the previous cache
    /// is left intact.
    pub fn set_layer(&mut self, layer: RasterLayer) -> ViewerResult<bool> {
        let key = CacheKey::new(&layer, self.config.projection, self.bitmap_size());
        let cached = self.cache.as_ref().is_some_and(|c| c.key == key);
        let rendered = if cached {
            let display_changed = self
                .layer
                .as_ref()
                .map(|old| old.unit != layer.unit || old.difference != layer.difference)
                .unwrap_or(true);
            if display_changed {
                let legend = self.build_legend(&layer)?;
                if let Some(cache) = self.cache.as_mut() {
                    cache.legend = legend;
                }
            }
            false
        } else {
            let cache = self.full_render(&layer, key)?;
            self.swap_cache(cache)?;
            true
        };
        self.layer = Some(layer);
        Ok(rendered)
    }

    /// Recolor the current layer.
    pub fn set_palette(&mut self, palette: Palette) -> ViewerResult<bool> {
        match self.layer.clone() {
            Some(layer) => self.set_layer(RasterLayer { palette, ..layer }),
            None => Ok(false),
        }
    }

    /// Change the display unit; the bitmap stays, tooltip and legend follow.
    pub fn set_unit(&mut self, unit: DisplayUnit) -> ViewerResult<()> {
        if let Some(layer) = self.layer.clone() {
            self.set_layer(RasterLayer { unit, ..layer })?;
        }
        Ok(())
    }

    /// New viewport size or pixel ratio. Re-renders the current layer.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) -> ViewerResult<bool> {
        let config = MapViewConfig {
            width,
            height,
            device_pixel_ratio,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        self.surface = new_surface(&self.config)?;
        match self.layer.clone() {
            Some(layer) => self.set_layer(layer),
            None => Ok(false),
        }
    }

    /// Drop the current layer: nothing to render.
    pub fn clear(&mut self) {
        self.layer = None;
        self.cache = None;
    }

    pub fn has_raster(&self) -> bool {
        self.cache.is_some()
    }

    fn bitmap_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn build_legend(&self, layer: &RasterLayer) -> ViewerResult<Legend> {
        Legend::build(
            &layer.palette,
            &layer.range,
            &layer.unit,
            layer.difference,
            self.config.legend_width,
            self.config.legend_height,
        )
    }

    fn full_render(&mut self, layer: &RasterLayer, key: CacheKey) -> ViewerResult<RasterCache> {
        let start = Instant::now();
        let (width, height) = key.size;
        let target = RenderTarget::new(width, height, self.config.projection);
        let raster = render(&layer.grid, &layer.palette, &layer.range, &target)?;
        let legend = self.build_legend(layer)?;

        let elapsed = start.elapsed().as_secs_f64();
        counter!("map_full_renders_total").increment(1);
        histogram!("map_full_render_seconds").record(elapsed);
        self.stats.full_renders += 1;
        info!(
            generation = layer.generation,
            palette = layer.palette.name(),
            min = layer.range.min,
            max = layer.range.max,
            elapsed_ms = elapsed * 1000.0,
            "Full raster render"
        );
        Ok(RasterCache { key, raster, legend })
    }

    /// Swap in a finished cache and rebuild the backing store.
    fn swap_cache(&mut self, cache: RasterCache) -> ViewerResult<()> {
        let surface = new_surface(&self.config)?;
        self.cache = Some(cache);
        self.surface = surface;
        Ok(())
    }

    /// Compose the frame: background, wrapped raster, borders, labels.
    pub fn redraw(&mut self) -> &Pixmap {
        let dpr = self.config.device_pixel_ratio as f64;
        let transform = self.transform;
        let world = self.world_size();

        match &self.cache {
            Some(cache) => {
                let tiles =
                    draw_wrapped(&mut self.surface, &cache.raster.bitmap, &transform, dpr, self.background);
                debug!(tiles, zoom = transform.zoom, pan_x = transform.pan_x, "Wrapped redraw");
            }
            None => self.surface.fill(self.background.to_color()),
        }

        if let Some(data) = self.overlay.get() {
            let borders = data.borders_for(transform.zoom, self.config.fine_border_zoom);
            let style = BorderStyle {
                color: self.border,
                width: self.config.border_width,
            };
            draw_borders(
                &mut self.surface,
                borders,
                self.config.projection,
                &transform,
                world,
                dpr,
                style,
            );

            if let Some(text) = &self.text {
                let size = self.config.label_font_size;
                let placed = place_labels(
                    &data.labels,
                    self.config.projection,
                    &transform,
                    world,
                    world,
                    |name| {
                        let (w, h) = text.measure(name, size);
                        (w as f64, h as f64)
                    },
                );
                draw_labels(&mut self.surface, &placed, text, size, self.label, dpr);
            }
        }

        counter!("map_redraws_total").increment(1);
        self.stats.redraws += 1;
        &self.surface
    }

    pub fn encode_frame(&self) -> PngResult<Vec<u8>> {
        encode_pixmap(&self.surface)
    }

    /// Value under a screen point, if any.
    pub fn lookup(&self, sx: f64, sy: f64) -> Option<PointValue> {
        let cache = self.cache.as_ref()?;
        lookup(&cache.raster.lookup, &self.transform, self.config.projection, sx, sy)
    }

    /// Tooltip for a screen point; hidden without data or value.
    pub fn tooltip_at(&self, sx: f64, sy: f64) -> TooltipUpdate {
        let Some(layer) = &self.layer else {
            return TooltipUpdate::Hide;
        };
        let found = self.lookup(sx, sy);
        tooltip_for(found.as_ref(), &layer.display(), sx, sy, self.config.tooltip_offset)
    }

    /// Feed one pointer event through the interaction state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> PointerOutcome {
        let (_, world_h) = self.world_size();
        let view_h = world_h;
        match event {
            PointerEvent::Wheel { x, y, delta_y } => {
                let changed = self.transform.zoom_at(x, y, delta_y, self.config.zoom_bounds());
                if changed {
                    self.transform.clamp_pan_y(world_h, view_h);
                    PointerOutcome::redraw()
                } else {
                    PointerOutcome::default()
                }
            }
            PointerEvent::Down { x, y } => {
                self.drag = DragState::begin(&self.transform, x, y);
                PointerOutcome::tooltip(TooltipUpdate::Hide)
            }
            PointerEvent::Move { x, y } => match self.drag.pan_for(x, y) {
                Some((pan_x, pan_y)) => {
                    self.transform.pan_x = pan_x;
                    self.transform.pan_y = pan_y;
                    self.transform.clamp_pan_y(world_h, view_h);
                    PointerOutcome::redraw()
                }
                None => PointerOutcome::tooltip(self.tooltip_at(x, y)),
            },
            PointerEvent::Up { .. } => {
                self.drag = DragState::Idle;
                PointerOutcome::default()
            }
            PointerEvent::Leave => {
                self.drag = DragState::Idle;
                PointerOutcome::tooltip(TooltipUpdate::Hide)
            }
        }
    }
}

fn new_surface(config: &MapViewConfig) -> ViewerResult<Pixmap> {
    let (w, h) = config.surface_size();
    Pixmap::new(w, h)
        .ok_or_else(|| ViewerError::RenderError(format!("invalid surface size {}x{}", w, h)))
}
