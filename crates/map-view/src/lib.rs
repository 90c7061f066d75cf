//! Interactive map engine: viewport transform, wrapped redraw, pointer
//! lookup and the base-map overlay, owned by a single [`MapView`].
//!
//! The engine is host-agnostic. Pointer input arrives as [`PointerEvent`]s,
//! frames come out as tiny-skia pixmaps and tooltip changes as
//! [`TooltipUpdate`] values.

pub mod config;
pub mod events;
pub mod lookup;
pub mod overlay;
pub mod redraw;
pub mod transform;
pub mod view;

pub use config::MapViewConfig;
pub use events::{PointerEvent, PointerOutcome};
pub use lookup::{lookup, tooltip_for, PointValue, TooltipUpdate, ValueDisplay};
pub use overlay::{BaseMapOverlay, BorderSet, BorderSource, LabelSet, OverlayData, OverlayError};
pub use redraw::{draw_wrapped, tile_range};
pub use transform::{DragState, ViewportTransform};
pub use view::{MapView, RasterLayer, ViewStats};
