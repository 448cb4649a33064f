//! Layer descriptors pushed to the rendering surface.

use super::color::Rgba;
use super::types::{LngLat, RenderArc, RenderNode};
use super::zoom::PixelRange;

/// World radius to pixel radius before clamping.
pub(crate) const NODE_RADIUS_SCALE: f64 = 2.0;

/// Scatter-style layer of points.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLayer {
	/// Stable layer id.
	pub id: &'static str,
	/// Points to draw.
	pub data: Vec<RenderNode>,
	/// Multiplier from world radius to pixels.
	pub radius_scale: f64,
	/// Clamp applied after scaling.
	pub radius_pixels: PixelRange,
	/// Draw an outline around each point.
	pub stroked: bool,
	/// Outline color.
	pub line_color: Rgba,
	/// Outline width.
	pub line_width_pixels: f64,
	/// Responds to pointer hits.
	pub pickable: bool,
	/// Draw `RenderNode::label` next to each point.
	pub show_labels: bool,
}

impl PointLayer {
	/// White-outlined, pickable points.
	pub fn new(data: Vec<RenderNode>, radius_pixels: PixelRange, show_labels: bool) -> Self {
		Self {
			id: "entity-nodes",
			data,
			radius_scale: NODE_RADIUS_SCALE,
			radius_pixels,
			stroked: true,
			line_color: [255, 255, 255, 255],
			line_width_pixels: 1.0,
			pickable: true,
			show_labels,
		}
	}

	/// On-screen radius of `node`.
	pub fn radius_px(&self, node: &RenderNode) -> f64 {
		self.radius_pixels.clamp(node.radius * self.radius_scale)
	}

	/// Fill color of `node`.
	pub fn fill_color(&self, node: &RenderNode) -> Rgba {
		node.color
	}
}

/// Polyline layer with per-vertex colors.
#[derive(Clone, Debug, PartialEq)]
pub struct PathLayer {
	/// Stable layer id.
	pub id: &'static str,
	/// Arcs to draw.
	pub data: Vec<RenderArc>,
	/// Clamp for arc widths.
	pub width_pixels: PixelRange,
	/// Round line ends.
	pub rounded_caps: bool,
	/// Round segment joins.
	pub rounded_joints: bool,
	/// Responds to pointer hits.
	pub pickable: bool,
}

impl PathLayer {
	/// Rounded, pickable paths.
	pub fn new(data: Vec<RenderArc>, width_pixels: PixelRange) -> Self {
		Self {
			id: "relation-arcs",
			data,
			width_pixels,
			rounded_caps: true,
			rounded_joints: true,
			pickable: true,
		}
	}

	/// On-screen width of `arc`.
	pub fn width_px(&self, arc: &RenderArc) -> f64 {
		self.width_pixels.clamp(arc.width)
	}

	/// Vertices of `arc`.
	pub fn path<'a>(&self, arc: &'a RenderArc) -> &'a [LngLat] {
		&arc.path
	}

	/// One color per vertex of `arc`.
	pub fn vertex_colors<'a>(&self, arc: &'a RenderArc) -> &'a [Rgba] {
		&arc.colors
	}
}

/// Edit handle overlay with its arc's endpoints, for guide lines.
#[derive(Clone, Debug, PartialEq)]
pub struct HandleOverlay {
	/// Where the handle sits.
	pub position: LngLat,
	/// Source and target of the edited arc.
	pub anchors: [LngLat; 2],
}

/// Complete set of layers for one frame. `paths` is absent when arcs are
/// suppressed at the current zoom.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSet {
	/// Entity markers.
	pub points: PointLayer,
	/// Relation arcs, if drawn at this zoom.
	pub paths: Option<PathLayer>,
	/// Edit handle, while a session is open.
	pub handle: Option<HandleOverlay>,
}

impl LayerSet {
	/// Nothing on screen.
	pub fn empty() -> Self {
		Self {
			points: PointLayer::new(Vec::new(), PixelRange::new(0.0, 0.0), false),
			paths: None,
			handle: None,
		}
	}
}

/// Something that can display a [`LayerSet`].
pub trait RenderSurface {
	/// Replaces everything on screen with `layers`.
	fn set_layers(&mut self, layers: &LayerSet);

	/// Moves the view. Surfaces without camera control ignore this.
	fn fly_to(&mut self, _center: LngLat, _zoom: f64) {}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(radius: f64) -> RenderNode {
		RenderNode {
			id: "n".into(),
			label: "n".into(),
			position: [0.0, 0.0],
			color: [1, 2, 3, 255],
			radius,
		}
	}

	#[test]
	fn node_radius_is_clamped_to_pixel_range() {
		let far = PointLayer::new(Vec::new(), PixelRange::new(4.0, 12.0), false);
		assert_eq!(far.radius_px(&node(6.0)), 12.0);
		assert_eq!(far.radius_px(&node(1.0)), 4.0);
		let near = PointLayer::new(Vec::new(), PixelRange::new(12.0, 30.0), true);
		assert_eq!(near.radius_px(&node(8.0)), 16.0);
	}

	#[test]
	fn arc_width_is_clamped_to_link_range() {
		let arc = RenderArc {
			path: vec![[0.0, 0.0], [1.0, 1.0]],
			colors: vec![[0, 0, 0, 255]; 2],
			width: 4.0,
			source_id: "a".into(),
			target_id: "b".into(),
			link: crate::components::geo_map::types::LinkRef { entity: 0, link: 0 },
		};
		assert_eq!(PathLayer::new(Vec::new(), PixelRange::new(1.0, 3.0)).width_px(&arc), 3.0);
		assert_eq!(PathLayer::new(Vec::new(), PixelRange::new(1.0, 6.0)).width_px(&arc), 4.0);
	}
}
