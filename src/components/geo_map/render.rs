use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::color::to_css;
use super::error::GeoMapError;
use super::layers::{HandleOverlay, LayerSet, PathLayer, PointLayer, RenderSurface};
use super::types::{LngLat, RenderArc, RenderNode};
use super::viewport::Viewport;

const BACKGROUND: &str = "#eef2f5";
pub(crate) const HANDLE_RADIUS: f64 = 6.0;
/// Extra slop around the handle and around arcs for pointer hits.
pub(crate) const HIT_SLOP: f64 = 4.0;

/// Canvas-backed rendering surface.
pub struct CanvasSurface {
	ctx: CanvasRenderingContext2d,
	/// Camera used to project layers.
	pub viewport: Viewport,
}

impl CanvasSurface {
	/// Binds to the 2D context of `canvas`.
	pub fn new(canvas: &HtmlCanvasElement, viewport: Viewport) -> Result<Self, GeoMapError> {
		let ctx = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
			.ok_or(GeoMapError::CanvasContextUnavailable)?;
		Ok(Self { ctx, viewport })
	}
}

impl RenderSurface for CanvasSurface {
	fn set_layers(&mut self, layers: &LayerSet) {
		render(layers, &self.viewport, &self.ctx);
	}

	fn fly_to(&mut self, center: LngLat, zoom: f64) {
		self.viewport.center = center;
		self.viewport.zoom = zoom;
	}
}

pub(crate) fn render(layers: &LayerSet, viewport: &Viewport, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, viewport.width, viewport.height);
	if let Some(paths) = &layers.paths {
		draw_paths(paths, viewport, ctx);
	}
	draw_points(&layers.points, viewport, ctx);
	if let Some(handle) = &layers.handle {
		draw_handle(handle, viewport, ctx);
	}
}

fn draw_paths(layer: &PathLayer, viewport: &Viewport, ctx: &CanvasRenderingContext2d) {
	ctx.set_line_cap(if layer.rounded_caps { "round" } else { "butt" });
	ctx.set_line_join(if layer.rounded_joints { "round" } else { "miter" });

	for arc in &layer.data {
		ctx.set_line_width(layer.width_px(arc));
		let points: Vec<(f64, f64)> = layer.path(arc).iter().map(|&p| viewport.project(p)).collect();
		// one segment per vertex color gives the gradient
		for (segment, color) in points.windows(2).zip(layer.vertex_colors(arc)) {
			ctx.set_stroke_style_str(&to_css(*color));
			ctx.begin_path();
			ctx.move_to(segment[0].0, segment[0].1);
			ctx.line_to(segment[1].0, segment[1].1);
			ctx.stroke();
		}
	}
}

fn draw_points(layer: &PointLayer, viewport: &Viewport, ctx: &CanvasRenderingContext2d) {
	for node in &layer.data {
		let (x, y) = viewport.project(node.position);
		let radius = layer.radius_px(node);

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&to_css(layer.fill_color(node)));
		ctx.fill();
		if layer.stroked {
			ctx.set_stroke_style_str(&to_css(layer.line_color));
			ctx.set_line_width(layer.line_width_pixels);
			ctx.stroke();
		}

		if layer.show_labels {
			ctx.set_fill_style_str("rgba(20, 20, 30, 0.85)");
			ctx.set_font("12px sans-serif");
			let _ = ctx.fill_text(&node.label, x + radius + 3.0, y + 4.0);
		}
	}
}

fn draw_handle(handle: &HandleOverlay, viewport: &Viewport, ctx: &CanvasRenderingContext2d) {
	let (hx, hy) = viewport.project(handle.position);

	let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(4.0), &JsValue::from_f64(4.0)));
	ctx.set_stroke_style_str("rgba(51, 51, 51, 0.6)");
	ctx.set_line_width(1.0);
	for anchor in handle.anchors {
		let (ax, ay) = viewport.project(anchor);
		ctx.begin_path();
		ctx.move_to(ax, ay);
		ctx.line_to(hx, hy);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	ctx.begin_path();
	let _ = ctx.arc(hx, hy, HANDLE_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str("#ffffff");
	ctx.fill();
	ctx.set_stroke_style_str("#333333");
	ctx.set_line_width(2.0);
	ctx.stroke();
}

/// What lies under the pointer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Pick {
	Handle,
	Node(RenderNode),
	Arc(RenderArc),
}

/// Hit-tests canvas pixel `(sx, sy)`; the handle wins over nodes, nodes over arcs.
pub(crate) fn pick(layers: &LayerSet, viewport: &Viewport, sx: f64, sy: f64) -> Option<Pick> {
	if let Some(handle) = &layers.handle {
		let (hx, hy) = viewport.project(handle.position);
		if (hx - sx).hypot(hy - sy) <= HANDLE_RADIUS + HIT_SLOP {
			return Some(Pick::Handle);
		}
	}

	// topmost (last drawn) first
	let node = layers.points.data.iter().rev().find(|node| {
		let (x, y) = viewport.project(node.position);
		(x - sx).hypot(y - sy) <= layers.points.radius_px(node)
	});
	if let Some(node) = node {
		return Some(Pick::Node(node.clone()));
	}

	let paths = layers.paths.as_ref()?;
	paths
		.data
		.iter()
		.rev()
		.find(|arc| {
			let tolerance = paths.width_px(arc) / 2.0 + HIT_SLOP;
			let points: Vec<(f64, f64)> = arc.path.iter().map(|&p| viewport.project(p)).collect();
			points
				.windows(2)
				.any(|s| segment_distance((sx, sy), s[0], s[1]) <= tolerance)
		})
		.map(|arc| Pick::Arc(arc.clone()))
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
	};
	(p.0 - (a.0 + t * dx)).hypot(p.1 - (a.1 + t * dy))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::geo_map::types::LinkRef;
	use crate::components::geo_map::viewport::ViewState;
	use crate::components::geo_map::zoom::PixelRange;

	fn viewport() -> Viewport {
		Viewport::new(
			ViewState {
				center: [0.0, 0.0],
				zoom: 12.0,
			},
			800.0,
			600.0,
		)
	}

	fn layers(vp: &Viewport) -> LayerSet {
		let west = vp.unproject(200.0, 300.0);
		let east = vp.unproject(600.0, 300.0);
		let node = |id: &str, position| RenderNode {
			id: id.into(),
			label: id.into(),
			position,
			color: [0, 0, 0, 255],
			radius: 6.0,
		};
		LayerSet {
			points: PointLayer::new(
				vec![node("w", west), node("e", east)],
				PixelRange::new(12.0, 30.0),
				false,
			),
			paths: Some(PathLayer::new(
				vec![RenderArc {
					path: vec![west, vp.unproject(400.0, 300.0), east],
					colors: vec![[0, 0, 0, 255]; 3],
					width: 2.0,
					source_id: "w".into(),
					target_id: "e".into(),
					link: LinkRef { entity: 0, link: 0 },
				}],
				PixelRange::new(1.0, 6.0),
			)),
			handle: None,
		}
	}

	#[test]
	fn picks_node_within_radius() {
		let vp = viewport();
		let layers = layers(&vp);
		match pick(&layers, &vp, 205.0, 305.0) {
			Some(Pick::Node(node)) => assert_eq!(node.id, "w"),
			other => panic!("expected node, got {other:?}"),
		}
	}

	#[test]
	fn picks_arc_along_its_path() {
		let vp = viewport();
		let layers = layers(&vp);
		assert!(matches!(pick(&layers, &vp, 400.0, 303.0), Some(Pick::Arc(_))));
		assert_eq!(pick(&layers, &vp, 400.0, 340.0), None);
	}

	#[test]
	fn handle_has_priority() {
		let vp = viewport();
		let mut layers = layers(&vp);
		layers.handle = Some(HandleOverlay {
			position: vp.unproject(400.0, 300.0),
			anchors: [[0.0, 0.0], [0.0, 0.0]],
		});
		assert_eq!(pick(&layers, &vp, 402.0, 301.0), Some(Pick::Handle));
	}

	#[test]
	fn hidden_paths_are_not_pickable() {
		let vp = viewport();
		let mut layers = layers(&vp);
		layers.paths = None;
		assert_eq!(pick(&layers, &vp, 400.0, 300.0), None);
	}

	#[test]
	fn segment_distance_clamps_to_endpoints() {
		assert_eq!(segment_distance((0.0, 5.0), (0.0, 0.0), (10.0, 0.0)), 5.0);
		assert_eq!(segment_distance((-3.0, 4.0), (0.0, 0.0), (10.0, 0.0)), 5.0);
		assert_eq!(segment_distance((1.0, 1.0), (0.0, 0.0), (0.0, 0.0)), 2f64.sqrt());
	}
}
