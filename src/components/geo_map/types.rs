use std::collections::HashMap;
use std::fmt;

use super::color::Rgba;

/// `[lng, lat]`, the order the rendering surface expects.
pub type LngLat = [f64; 2];

/// Latitude/longitude pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
	/// Latitude.
	pub lat: f64,
	/// Longitude.
	pub lng: f64,
}

impl GeoPoint {
	/// Point at `lat`, `lng`.
	pub const fn new(lat: f64, lng: f64) -> Self {
		Self { lat, lng }
	}

	/// Neither coordinate is NaN.
	pub fn is_valid(&self) -> bool {
		!self.lat.is_nan() && !self.lng.is_nan()
	}

	/// Same point in surface order.
	pub fn lng_lat(&self) -> LngLat {
		[self.lng, self.lat]
	}
}

/// Loosely typed attribute value used for color grouping.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
	/// No value.
	Null,
	/// Boolean flag.
	Bool(bool),
	/// Numeric value.
	Number(f64),
	/// Free text.
	Text(String),
}

impl AttributeValue {
	/// Empty, zero, false and null values all group under the unknown bucket.
	pub fn is_blank(&self) -> bool {
		match self {
			Self::Null => true,
			Self::Bool(b) => !b,
			Self::Number(n) => *n == 0.0 || n.is_nan(),
			Self::Text(s) => s.is_empty(),
		}
	}
}

impl fmt::Display for AttributeValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Number(n) => write!(f, "{n}"),
			Self::Text(s) => f.write_str(s),
		}
	}
}

impl From<&str> for AttributeValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<f64> for AttributeValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

/// Whether a link reads one way or both ways.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkDirection {
	/// From the owning entity to the target.
	#[default]
	Directed,
	/// Symmetric.
	Undirected,
}

/// Relation from the owning entity to `target_id`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
	/// Id of the entity this link points at.
	pub target_id: String,
	/// Kind of relation.
	pub relation_type: String,
	/// Display text, if any.
	pub label: Option<String>,
	/// Reading direction.
	pub direction: LinkDirection,
	/// Set once the user has dragged the curve; `None` means default curvature.
	pub custom_control_point: Option<LngLat>,
}

impl Link {
	/// Directed link with default curvature.
	pub fn new(target_id: impl Into<String>, relation_type: impl Into<String>) -> Self {
		Self {
			target_id: target_id.into(),
			relation_type: relation_type.into(),
			..Default::default()
		}
	}
}

/// Domain object placed on the map by its `geo` coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
	/// Unique id.
	pub id: String,
	/// Name shown next to the marker.
	pub primary_label: String,
	/// Location; entities without one are not drawn.
	pub geo: Option<GeoPoint>,
	/// Free-form attributes, used for grouping.
	pub attributes: HashMap<String, AttributeValue>,
	/// Outgoing relations.
	pub links: Vec<Link>,
}

impl Entity {
	/// Entity labelled with its own id.
	pub fn new(id: impl Into<String>) -> Self {
		let id = id.into();
		Self {
			primary_label: id.clone(),
			id,
			..Default::default()
		}
	}

	/// Sets the location.
	pub fn with_geo(mut self, lat: f64, lng: f64) -> Self {
		self.geo = Some(GeoPoint::new(lat, lng));
		self
	}

	/// Sets the display label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.primary_label = label.into();
		self
	}

	/// Adds one attribute.
	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}

	/// Adds one outgoing link.
	pub fn with_link(mut self, link: Link) -> Self {
		self.links.push(link);
		self
	}

	/// Position if present and not NaN.
	pub fn position(&self) -> Option<LngLat> {
		self.geo.filter(GeoPoint::is_valid).map(|g| g.lng_lat())
	}
}

/// Stable address of a link inside an [`EntityStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinkRef {
	/// Index of the owning entity.
	pub entity: usize,
	/// Index into that entity's `links`.
	pub link: usize,
}

/// Arena of entities, indexed by id.
///
/// Render primitives point back into it with [`LinkRef`] so the store stays the
/// single owner of every link.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
	entities: Vec<Entity>,
	by_id: HashMap<String, usize>,
}

impl EntityStore {
	/// Takes ownership of `entities`, keeping their order.
	pub fn new(entities: Vec<Entity>) -> Self {
		// later duplicates shadow earlier ones
		let by_id = entities
			.iter()
			.enumerate()
			.map(|(i, e)| (e.id.clone(), i))
			.collect();
		Self { entities, by_id }
	}

	/// Number of entities.
	pub fn len(&self) -> usize {
		self.entities.len()
	}

	/// No entities at all.
	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	/// Entities with their indices, in order.
	pub fn iter(&self) -> impl Iterator<Item = (usize, &Entity)> {
		self.entities.iter().enumerate()
	}

	/// Entity by id.
	pub fn get(&self, id: &str) -> Option<&Entity> {
		self.index_of(id).map(|i| &self.entities[i])
	}

	/// Index of the entity with `id`.
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.by_id.get(id).copied()
	}

	/// Entity by index.
	pub fn entity_at(&self, index: usize) -> Option<&Entity> {
		self.entities.get(index)
	}

	/// Link at `at`, if the slot exists.
	pub fn link(&self, at: LinkRef) -> Option<&Link> {
		self.entities.get(at.entity)?.links.get(at.link)
	}

	/// Mutable link at `at`.
	pub fn link_mut(&mut self, at: LinkRef) -> Option<&mut Link> {
		self.entities.get_mut(at.entity)?.links.get_mut(at.link)
	}

	/// First link from `source_id` to `target_id`.
	pub fn find_link(&self, source_id: &str, target_id: &str) -> Option<LinkRef> {
		let entity = self.index_of(source_id)?;
		let link = self.entities[entity]
			.links
			.iter()
			.position(|l| l.target_id == target_id)?;
		Some(LinkRef { entity, link })
	}
}

/// Identifies an arc by its endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArcKey {
	/// Entity owning the link.
	pub source_id: String,
	/// Entity the link points at.
	pub target_id: String,
}

/// Drawable point, rebuilt on every pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
	/// Entity id.
	pub id: String,
	/// Entity label.
	pub label: String,
	/// Marker position.
	pub position: LngLat,
	/// Fill color.
	pub color: Rgba,
	/// World-space radius.
	pub radius: f64,
}

/// Drawable curved connector, rebuilt on every pass.
///
/// `path` and `colors` always have the same length.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderArc {
	/// Sampled curve.
	pub path: Vec<LngLat>,
	/// Color per sample.
	pub colors: Vec<Rgba>,
	/// Width before clamping; shorter arcs are wider.
	pub width: f64,
	/// Entity the arc starts at.
	pub source_id: String,
	/// Entity the arc ends at.
	pub target_id: String,
	/// Where the originating link lives in the store.
	pub link: LinkRef,
}

impl RenderArc {
	/// Endpoint ids of this arc.
	pub fn key(&self) -> ArcKey {
		ArcKey {
			source_id: self.source_id.clone(),
			target_id: self.target_id.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nan_coordinates_have_no_position() {
		assert_eq!(Entity::new("a").with_geo(f64::NAN, 1.0).position(), None);
		assert_eq!(Entity::new("a").position(), None);
		assert_eq!(Entity::new("a").with_geo(2.0, 1.0).position(), Some([1.0, 2.0]));
	}

	#[test]
	fn store_resolves_links_by_ref() {
		let mut store = EntityStore::new(vec![
			Entity::new("a").with_link(Link::new("b", "knows")),
			Entity::new("b"),
		]);
		let at = store.find_link("a", "b").expect("link");
		assert_eq!(at, LinkRef { entity: 0, link: 0 });
		store.link_mut(at).expect("link").custom_control_point = Some([1.0, 1.0]);
		assert_eq!(store.link(at).and_then(|l| l.custom_control_point), Some([1.0, 1.0]));
		assert_eq!(store.find_link("b", "a"), None);
	}

	#[test]
	fn blank_attributes() {
		assert!(AttributeValue::Null.is_blank());
		assert!(AttributeValue::Text(String::new()).is_blank());
		assert!(AttributeValue::Number(0.0).is_blank());
		assert!(!AttributeValue::from("x").is_blank());
		assert_eq!(AttributeValue::Number(3.0).to_string(), "3");
	}
}
