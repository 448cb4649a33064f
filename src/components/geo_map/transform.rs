//! Entity/link collection to render primitives.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::bezier::calculate_bezier_path;
use super::color::{Rgba, hex_to_color};
use super::types::{Entity, EntityStore, LinkRef, RenderArc, RenderNode};

pub(crate) const DEFAULT_NODE_COLOR: &str = "#0077b6";
pub(crate) const DEFAULT_ARC_COLOR: &str = "#999999";
/// Bucket used when the grouping attribute is missing or blank.
pub(crate) const UNKNOWN_BUCKET: &str = "Unknown";
pub(crate) const ARC_ALPHA: u8 = 200;
pub(crate) const NODE_RADIUS: f64 = 6.0;
pub(crate) const HOVERED_NODE_RADIUS: f64 = 8.0;

/// How entities are colored: an attribute to group by and a value -> hex table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorScheme {
	/// Attribute whose value picks the color.
	pub group_by: Option<String>,
	/// Attribute value to `#rrggbb`.
	pub category_colors: HashMap<String, String>,
}

impl ColorScheme {
	/// Hex color for `entity`, or `fallback` when no grouping applies.
	pub fn resolve<'a>(&'a self, entity: &Entity, fallback: &'a str) -> &'a str {
		let Some(column) = self.group_by.as_deref() else {
			return fallback;
		};
		let bucket = entity
			.attributes
			.get(column)
			.filter(|v| !v.is_blank())
			.map_or_else(|| UNKNOWN_BUCKET.to_string(), ToString::to_string);
		self.category_colors
			.get(&bucket)
			.map_or(fallback, String::as_str)
	}
}

/// One transform pass over a borrowed store.
pub struct MapDataTransformer<'a> {
	/// Entities to transform.
	pub store: &'a EntityStore,
	/// Ids allowed on screen; `None` shows everything.
	pub visible: Option<&'a HashSet<String>>,
	/// Grouping and color table.
	pub colors: &'a ColorScheme,
	/// Entity drawn with the enlarged radius.
	pub hovered_id: Option<&'a str>,
	/// Bezier segments per arc.
	pub steps: usize,
}

impl MapDataTransformer<'_> {
	fn is_visible(&self, entity: &Entity) -> bool {
		self.visible.is_none_or(|ids| ids.contains(&entity.id))
	}

	/// One node per visible entity with a position.
	pub fn build_node_data(&self) -> Vec<RenderNode> {
		self.store
			.iter()
			.filter(|(_, entity)| self.is_visible(entity))
			.filter_map(|(_, entity)| {
				let position = entity.position()?;
				let hex = self.colors.resolve(entity, DEFAULT_NODE_COLOR);
				let radius = if self.hovered_id == Some(entity.id.as_str()) {
					HOVERED_NODE_RADIUS
				} else {
					NODE_RADIUS
				};
				Some(RenderNode {
					id: entity.id.clone(),
					label: entity.primary_label.clone(),
					position,
					color: hex_to_color(hex, 255),
					radius,
				})
			})
			.collect()
	}

	/// One arc per link whose endpoints both have distinct positions.
	pub fn build_arc_data(&self) -> Vec<RenderArc> {
		// Spans every entity, not just visible ones, so a link can still reach a
		// target hidden by the filter.
		let endpoints: HashMap<&str, Rgba> = self
			.store
			.iter()
			.map(|(_, e)| {
				let hex = self.colors.resolve(e, DEFAULT_ARC_COLOR);
				(e.id.as_str(), hex_to_color(hex, ARC_ALPHA))
			})
			.collect();

		let mut arcs = Vec::new();
		for (entity_index, source) in self.store.iter() {
			if !self.is_visible(source) {
				continue;
			}
			let Some(start) = source.position() else {
				continue;
			};
			let Some(&start_color) = endpoints.get(source.id.as_str()) else {
				continue;
			};

			for (link_index, link) in source.links.iter().enumerate() {
				let Some(target) = self.store.get(&link.target_id) else {
					continue;
				};
				let Some(end) = target.position() else {
					continue;
				};
				let distance = (end[0] - start[0]).hypot(end[1] - start[1]);
				if distance == 0.0 {
					continue;
				}
				let end_color = endpoints
					.get(target.id.as_str())
					.copied()
					.unwrap_or(start_color);

				let curve = calculate_bezier_path(
					start,
					end,
					start_color,
					end_color,
					link.custom_control_point,
					self.steps,
				);
				arcs.push(RenderArc {
					path: curve.path,
					colors: curve.colors,
					width: arc_width(distance),
					source_id: source.id.clone(),
					target_id: link.target_id.clone(),
					link: LinkRef {
						entity: entity_index,
						link: link_index,
					},
				});
			}
		}
		debug!("built {} arcs from {} entities", arcs.len(), self.store.len());
		arcs
	}
}

/// Longer arcs draw thinner, never below 1.
pub(crate) fn arc_width(distance: f64) -> f64 {
	(4.0 - distance * 10.0).max(1.0)
}
