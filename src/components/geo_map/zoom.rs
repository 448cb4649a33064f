//! Zoom-driven level-of-detail decisions.

/// World-space node radius for each zoom bucket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeRadiusConfig {
	/// Below `medium_zoom`.
	pub far: f64,
	/// Between `medium_zoom` and `details_visible_zoom`.
	pub medium: f64,
	/// From `details_visible_zoom` up.
	pub near: f64,
}

/// Thresholds for the level-of-detail policy.
///
/// Override single fields with struct update syntax:
/// `ZoomLevelConfig { links_visible_zoom: 9.0, ..Default::default() }`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomLevelConfig {
	/// Lowest zoom the view may reach.
	pub min_zoom: f64,
	/// Highest zoom the view may reach.
	pub max_zoom: f64,
	/// Zoom at which the view leaves the far bucket.
	pub medium_zoom: f64,
	/// Zoom at which arcs start being built and drawn.
	pub links_visible_zoom: f64,
	/// Zoom at which labels and the near bucket kick in.
	pub details_visible_zoom: f64,
	/// Node radius per bucket.
	pub node_radius: NodeRadiusConfig,
}

impl Default for ZoomLevelConfig {
	fn default() -> Self {
		Self {
			min_zoom: 3.0,
			max_zoom: 20.0,
			medium_zoom: 8.0,
			links_visible_zoom: 10.0,
			details_visible_zoom: 12.0,
			node_radius: NodeRadiusConfig {
				far: 3.0,
				medium: 6.0,
				near: 8.0,
			},
		}
	}
}

/// Inclusive pixel clamp handed to the rendering surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRange {
	/// Lower bound.
	pub min: f64,
	/// Upper bound; wins over `min`.
	pub max: f64,
}

impl PixelRange {
	/// Range from `min` to `max`.
	pub const fn new(min: f64, max: f64) -> Self {
		Self { min, max }
	}

	/// Clamps `value` into the range. A zero-width range pins to `max`.
	pub fn clamp(&self, value: f64) -> f64 {
		value.max(self.min).min(self.max)
	}
}

/// Discrete zoom bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomTier {
	/// Overview, below `medium_zoom`.
	Far,
	/// Regional view.
	Medium,
	/// Street level, labels shown.
	Near,
}

/// Tracks the current zoom and derives every LOD decision from it.
///
/// Nothing here is cached: each accessor recomputes from `current_zoom`, so
/// the answers can never go stale relative to the last [`ZoomLevel::update_zoom`].
#[derive(Clone, Debug)]
pub struct ZoomLevel {
	config: ZoomLevelConfig,
	current_zoom: f64,
}

impl ZoomLevel {
	/// Policy starting at `initial_zoom`.
	pub fn new(config: ZoomLevelConfig, initial_zoom: f64) -> Self {
		Self {
			config,
			current_zoom: initial_zoom,
		}
	}

	/// Thresholds in use.
	pub fn config(&self) -> &ZoomLevelConfig {
		&self.config
	}

	/// Last recorded zoom.
	pub fn current_zoom(&self) -> f64 {
		self.current_zoom
	}

	/// Records the zoom reported by the viewport. NaN is ignored.
	pub fn update_zoom(&mut self, zoom: f64) {
		if zoom.is_nan() {
			return;
		}
		self.current_zoom = zoom;
	}

	/// Bucket the current zoom falls into.
	pub fn tier(&self) -> ZoomTier {
		if self.current_zoom < self.config.medium_zoom {
			ZoomTier::Far
		} else if self.current_zoom < self.config.details_visible_zoom {
			ZoomTier::Medium
		} else {
			ZoomTier::Near
		}
	}

	/// Whether arcs are built and drawn at all.
	pub fn should_render_links(&self) -> bool {
		self.current_zoom >= self.config.links_visible_zoom
	}

	/// Whether node labels are drawn.
	pub fn should_show_details(&self) -> bool {
		self.current_zoom >= self.config.details_visible_zoom
	}

	/// Below link zoom the view is treated as an overview.
	pub fn should_use_aggregation(&self) -> bool {
		self.current_zoom < self.config.links_visible_zoom
	}

	/// World-space node radius for the current bucket.
	pub fn node_radius(&self) -> f64 {
		let radius = &self.config.node_radius;
		match self.tier() {
			ZoomTier::Far => radius.far,
			ZoomTier::Medium => radius.medium,
			ZoomTier::Near => radius.near,
		}
	}

	/// Pixel clamp for node radii.
	pub fn node_pixel_range(&self) -> PixelRange {
		match self.tier() {
			ZoomTier::Far => PixelRange::new(4.0, 12.0),
			ZoomTier::Medium => PixelRange::new(8.0, 12.0),
			ZoomTier::Near => PixelRange::new(12.0, 30.0),
		}
	}

	/// `{0, 0}` below link zoom, i.e. arcs are suppressed.
	pub fn link_width_range(&self) -> PixelRange {
		if self.current_zoom < self.config.links_visible_zoom {
			PixelRange::new(0.0, 0.0)
		} else if self.current_zoom < self.config.details_visible_zoom {
			PixelRange::new(1.0, 3.0)
		} else {
			PixelRange::new(1.0, 6.0)
		}
	}
}

impl Default for ZoomLevel {
	fn default() -> Self {
		Self::new(ZoomLevelConfig::default(), 10.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn at(zoom: f64) -> ZoomLevel {
		let mut level = ZoomLevel::default();
		level.update_zoom(zoom);
		level
	}

	#[test]
	fn links_appear_at_ten() {
		assert!(!at(9.99).should_render_links());
		assert!(at(10.0).should_render_links());
		assert!(at(9.99).should_use_aggregation());
		assert!(!at(10.0).should_use_aggregation());
	}

	#[test]
	fn details_appear_at_twelve() {
		assert!(!at(11.9).should_show_details());
		assert!(at(12.0).should_show_details());
	}

	#[test]
	fn node_pixel_range_buckets() {
		assert_eq!(at(7.9).node_pixel_range(), PixelRange::new(4.0, 12.0));
		assert_eq!(at(8.0).node_pixel_range(), PixelRange::new(8.0, 12.0));
		assert_eq!(at(11.9).node_pixel_range(), PixelRange::new(8.0, 12.0));
		assert_eq!(at(12.0).node_pixel_range(), PixelRange::new(12.0, 30.0));
	}

	#[test]
	fn link_width_range_buckets() {
		assert_eq!(at(9.0).link_width_range(), PixelRange::new(0.0, 0.0));
		assert_eq!(at(10.0).link_width_range(), PixelRange::new(1.0, 3.0));
		assert_eq!(at(15.0).link_width_range(), PixelRange::new(1.0, 6.0));
	}

	#[test]
	fn node_radius_follows_tier() {
		assert_eq!(at(5.0).tier(), ZoomTier::Far);
		assert_eq!(at(5.0).node_radius(), 3.0);
		assert_eq!(at(9.0).node_radius(), 6.0);
		assert_eq!(at(13.0).node_radius(), 8.0);
	}

	#[test]
	fn thresholds_are_configurable() {
		let config = ZoomLevelConfig {
			links_visible_zoom: 6.0,
			..Default::default()
		};
		let mut level = ZoomLevel::new(config, 4.0);
		assert!(!level.should_render_links());
		level.update_zoom(6.0);
		assert!(level.should_render_links());
	}

	#[test]
	fn nan_zoom_is_ignored() {
		let mut level = at(11.0);
		level.update_zoom(f64::NAN);
		assert_eq!(level.current_zoom(), 11.0);
	}

	#[test]
	fn pixel_range_clamps() {
		let range = PixelRange::new(1.0, 3.0);
		assert_eq!(range.clamp(0.2), 1.0);
		assert_eq!(range.clamp(2.5), 2.5);
		assert_eq!(range.clamp(9.0), 3.0);
	}
}
