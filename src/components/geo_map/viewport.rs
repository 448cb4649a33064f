use std::f64::consts::PI;

use super::types::LngLat;

pub(crate) const TILE_SIZE: f64 = 256.0;
/// Web Mercator stops being finite at the poles.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Center and zoom of the map, as reported on every view settle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
	/// Map center.
	pub center: LngLat,
	/// Zoom level.
	pub zoom: f64,
}

/// Web Mercator camera over a canvas of `width` x `height` pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
	/// Map center.
	pub center: LngLat,
	/// Zoom level.
	pub zoom: f64,
	/// Canvas width in pixels.
	pub width: f64,
	/// Canvas height in pixels.
	pub height: f64,
}

fn world_size(zoom: f64) -> f64 {
	TILE_SIZE * 2f64.powf(zoom)
}

fn to_world(point: LngLat, zoom: f64) -> (f64, f64) {
	let size = world_size(zoom);
	let lat = point[1].clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
	let x = (point[0] + 180.0) / 360.0 * size;
	let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
	(x, y)
}

fn from_world(x: f64, y: f64, zoom: f64) -> LngLat {
	let size = world_size(zoom);
	let lng = x / size * 360.0 - 180.0;
	let n = PI * (1.0 - 2.0 * y / size);
	let lat = n.sinh().atan().to_degrees();
	[lng, lat]
}

impl Viewport {
	/// Camera showing `view`.
	pub fn new(view: ViewState, width: f64, height: f64) -> Self {
		Self {
			center: view.center,
			zoom: view.zoom,
			width,
			height,
		}
	}

	/// Current center and zoom.
	pub fn view(&self) -> ViewState {
		ViewState {
			center: self.center,
			zoom: self.zoom,
		}
	}

	/// Geographic point to canvas pixels.
	pub fn project(&self, point: LngLat) -> (f64, f64) {
		let (cx, cy) = to_world(self.center, self.zoom);
		let (x, y) = to_world(point, self.zoom);
		(x - cx + self.width / 2.0, y - cy + self.height / 2.0)
	}

	/// Canvas pixels to geographic point.
	pub fn unproject(&self, sx: f64, sy: f64) -> LngLat {
		let (cx, cy) = to_world(self.center, self.zoom);
		from_world(
			cx + sx - self.width / 2.0,
			cy + sy - self.height / 2.0,
			self.zoom,
		)
	}

	/// Shifts the view by a screen-space delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.center = self.unproject(self.width / 2.0 - dx, self.height / 2.0 - dy);
	}

	/// Zooms to `zoom` keeping the geographic point under `(sx, sy)` fixed.
	pub fn zoom_about(&mut self, sx: f64, sy: f64, zoom: f64) {
		let anchor = self.unproject(sx, sy);
		self.zoom = zoom;
		let (ax, ay) = self.project(anchor);
		self.pan_by(sx - ax, sy - ay);
	}

	/// Follows a canvas resize; the center stays put.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
