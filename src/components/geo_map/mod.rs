//! Geographic relation map: entities as points, links as editable curves.

mod bezier;
mod color;
mod component;
mod editor;
mod error;
mod layers;
mod orchestrator;
mod render;
mod transform;
mod types;
mod viewport;
mod zoom;

pub use bezier::{BezierPath, DEFAULT_STEPS, calculate_bezier_path};
pub use color::{Rgba, hex_to_color, interpolate, parse_hex};
pub use component::GeoLinkCanvas;
pub use editor::{EditState, Handle, HandleId, LinkEditor, SelectOutcome};
pub use error::GeoMapError;
pub use layers::{HandleOverlay, LayerSet, PathLayer, PointLayer, RenderSurface};
pub use orchestrator::{MapCommand, MapConfig, MapEvent, MapRenderer};
pub use render::CanvasSurface;
pub use transform::{ColorScheme, MapDataTransformer};
pub use types::{
	ArcKey, AttributeValue, Entity, EntityStore, GeoPoint, Link, LinkDirection, LinkRef, LngLat,
	RenderArc, RenderNode,
};
pub use viewport::{ViewState, Viewport};
pub use zoom::{NodeRadiusConfig, PixelRange, ZoomLevel, ZoomLevelConfig, ZoomTier};
