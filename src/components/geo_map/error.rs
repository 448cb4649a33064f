use thiserror::Error;

/// Failures surfaced by the map view.
///
/// Missing geometry is not represented here: entities without coordinates are
/// simply left out of the render set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoMapError {
	/// A color string was not of the form `#rrggbb`.
	#[error("invalid hex color `{0}`")]
	InvalidHexColor(String),

	/// No browser window is available (non-browser target or worker).
	#[error("browser window unavailable")]
	NoWindow,

	/// The canvas refused to hand out a 2D rendering context.
	#[error("canvas 2d context unavailable")]
	CanvasContextUnavailable,
}
