//! Interactive curvature editing for a single arc.

use log::debug;

use super::bezier::resolve_control_point;
use super::types::{ArcKey, EntityStore, LinkRef, LngLat, RenderArc};

/// Identity of a mounted handle. A fresh id means a fresh handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

/// Draggable marker bound to the control point of the selected arc.
#[derive(Clone, Debug, PartialEq)]
pub struct Handle {
	/// Identity of this handle.
	pub id: HandleId,
	/// Current control point.
	pub position: LngLat,
	link: LinkRef,
}

/// Whether an arc is being edited.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EditState {
	/// No arc selected.
	#[default]
	Idle,
	/// An arc is selected and its handle is mounted.
	Editing {
		/// Selected arc.
		arc: ArcKey,
		/// Handle bound to the arc's link.
		handle: Handle,
	},
}

/// What a click on an arc did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
	/// The arc was already selected; nothing changed.
	Unchanged,
	/// A new handle was mounted.
	Editing,
	/// An endpoint has no position any more; no handle was created.
	Skipped,
}

/// Owns the single curvature-edit session.
#[derive(Debug, Default)]
pub struct LinkEditor {
	state: EditState,
	next_handle: u64,
}

impl LinkEditor {
	/// Idle editor.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current session state.
	pub fn state(&self) -> &EditState {
		&self.state
	}

	/// Arc being edited, if any.
	pub fn selected_arc(&self) -> Option<&ArcKey> {
		match &self.state {
			EditState::Editing { arc, .. } => Some(arc),
			EditState::Idle => None,
		}
	}

	/// Mounted handle, if any.
	pub fn handle(&self) -> Option<&Handle> {
		match &self.state {
			EditState::Editing { handle, .. } => Some(handle),
			EditState::Idle => None,
		}
	}

	/// Starts editing `arc`, unless it is already the one being edited.
	pub fn select_arc(&mut self, arc: &RenderArc, store: &EntityStore) -> SelectOutcome {
		let key = arc.key();
		if self.selected_arc() == Some(&key) {
			return SelectOutcome::Unchanged;
		}
		self.update_edit_handle(key, arc.link, store)
	}

	/// Replaces any mounted handle with one at the arc's current control point.
	///
	/// The control point is recomputed from the endpoint entities rather than
	/// read off a previous render pass.
	pub fn update_edit_handle(
		&mut self,
		arc: ArcKey,
		link: LinkRef,
		store: &EntityStore,
	) -> SelectOutcome {
		self.clear_edit_mode();

		let Some(position) = control_point_of(&arc, link, store) else {
			debug!("edit skipped for {} -> {}: endpoint has no position", arc.source_id, arc.target_id);
			return SelectOutcome::Skipped;
		};

		let id = HandleId(self.next_handle);
		self.next_handle += 1;
		debug!("editing arc {} -> {}", arc.source_id, arc.target_id);
		self.state = EditState::Editing {
			arc,
			handle: Handle { id, position, link },
		};
		SelectOutcome::Editing
	}

	/// Moves the handle and writes the new control point into the live link.
	///
	/// `on_update` runs synchronously after the write, once per frame. Returns
	/// `false` when no handle is mounted, i.e. the drag is ignored.
	pub fn drag_handle(
		&mut self,
		store: &mut EntityStore,
		position: LngLat,
		on_update: impl FnOnce(&EntityStore),
	) -> bool {
		let EditState::Editing { handle, .. } = &self.state else {
			return false;
		};
		let Some(link) = store.link_mut(handle.link) else {
			self.clear_edit_mode();
			return false;
		};
		link.custom_control_point = Some(position);
		if let EditState::Editing { handle, .. } = &mut self.state {
			handle.position = position;
		}
		on_update(store);
		true
	}

	/// Removes the handle and returns to idle. Returns whether a session ended.
	pub fn clear_edit_mode(&mut self) -> bool {
		let was_editing = matches!(self.state, EditState::Editing { .. });
		self.state = EditState::Idle;
		was_editing
	}

	/// Re-checks the session after the entity collection changed.
	///
	/// The session survives if the link still exists and both endpoints still
	/// have positions; the handle keeps its identity and moves to the
	/// recomputed control point. Otherwise the session is torn down and `false`
	/// is returned.
	///
	/// Parallel links share an [`ArcKey`], so the previous slot on the source
	/// entity is preferred over the first matching link.
	pub fn revalidate(&mut self, store: &EntityStore) -> bool {
		let EditState::Editing { arc, handle } = &mut self.state else {
			return true;
		};
		let refreshed = same_slot(store, arc, handle.link)
			.or_else(|| store.find_link(&arc.source_id, &arc.target_id))
			.and_then(|link| Some((link, control_point_of(&*arc, link, store)?)));
		match refreshed {
			Some((link, position)) => {
				handle.link = link;
				handle.position = position;
				true
			}
			None => {
				debug!("edit session dropped: {} -> {} no longer drawable", arc.source_id, arc.target_id);
				self.state = EditState::Idle;
				false
			}
		}
	}
}

/// `previous` re-resolved against the source entity's new position in `store`,
/// if that slot still points at the arc's target.
fn same_slot(store: &EntityStore, arc: &ArcKey, previous: LinkRef) -> Option<LinkRef> {
	let at = LinkRef {
		entity: store.index_of(&arc.source_id)?,
		link: previous.link,
	};
	(store.link(at)?.target_id == arc.target_id).then_some(at)
}

fn control_point_of(arc: &ArcKey, link: LinkRef, store: &EntityStore) -> Option<LngLat> {
	let start = store.get(&arc.source_id)?.position()?;
	let end = store.get(&arc.target_id)?.position()?;
	let custom = store.link(link)?.custom_control_point;
	Some(resolve_control_point(start, end, custom))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::geo_map::bezier::DEFAULT_STEPS;
	use crate::components::geo_map::transform::{ColorScheme, MapDataTransformer};
	use crate::components::geo_map::types::{Entity, Link};

	fn store() -> EntityStore {
		EntityStore::new(vec![
			Entity::new("a")
				.with_geo(0.0, 0.0)
				.with_link(Link::new("b", "x"))
				.with_link(Link::new("c", "x")),
			Entity::new("b").with_geo(1.0, 1.0),
			Entity::new("c").with_geo(0.0, 2.0),
		])
	}

	fn arcs(store: &EntityStore) -> Vec<RenderArc> {
		MapDataTransformer {
			store,
			visible: None,
			colors: &ColorScheme::default(),
			hovered_id: None,
			steps: DEFAULT_STEPS,
		}
		.build_arc_data()
	}

	#[test]
	fn clicking_an_arc_mounts_handle_at_control_point() {
		let store = store();
		let mut editor = LinkEditor::new();
		assert_eq!(editor.select_arc(&arcs(&store)[0], &store), SelectOutcome::Editing);
		let handle = editor.handle().expect("handle");
		assert!((handle.position[0] - 0.3).abs() < 1e-12);
		assert!((handle.position[1] - 0.7).abs() < 1e-12);
		assert_eq!(editor.selected_arc().map(|k| k.target_id.as_str()), Some("b"));
	}

	#[test]
	fn reclicking_the_same_arc_keeps_the_handle() {
		let store = store();
		let arcs = arcs(&store);
		let mut editor = LinkEditor::new();
		editor.select_arc(&arcs[0], &store);
		let first = editor.handle().map(|h| h.id);
		assert_eq!(editor.select_arc(&arcs[0], &store), SelectOutcome::Unchanged);
		assert_eq!(editor.handle().map(|h| h.id), first);
	}

	#[test]
	fn selecting_another_arc_replaces_the_handle() {
		let store = store();
		let arcs = arcs(&store);
		let mut editor = LinkEditor::new();
		editor.select_arc(&arcs[0], &store);
		let first = editor.handle().map(|h| h.id);
		editor.select_arc(&arcs[1], &store);
		assert_ne!(editor.handle().map(|h| h.id), first);
		assert_eq!(editor.selected_arc().map(|k| k.target_id.as_str()), Some("c"));
	}

	#[test]
	fn drag_writes_into_the_live_link() {
		let mut store = store();
		let arcs = arcs(&store);
		let mut editor = LinkEditor::new();
		editor.select_arc(&arcs[0], &store);

		let mut frames = 0;
		for target in [[0.2, 0.9], [0.5, 0.5]] {
			assert!(editor.drag_handle(&mut store, target, |_| frames += 1));
		}
		assert_eq!(frames, 2);
		assert_eq!(store.link(arcs[0].link).and_then(|l| l.custom_control_point), Some([0.5, 0.5]));
		assert_eq!(editor.handle().map(|h| h.position), Some([0.5, 0.5]));
	}

	#[test]
	fn drag_is_ignored_when_idle() {
		let mut store = store();
		let mut editor = LinkEditor::new();
		assert!(!editor.drag_handle(&mut store, [9.0, 9.0], |_| panic!("no re-render when idle")));
		assert!(store.iter().all(|(_, e)| e.links.iter().all(|l| l.custom_control_point.is_none())));
	}

	#[test]
	fn clear_returns_to_idle() {
		let store = store();
		let mut editor = LinkEditor::new();
		editor.select_arc(&arcs(&store)[0], &store);
		assert!(editor.clear_edit_mode());
		assert_eq!(editor.state(), &EditState::Idle);
		assert!(!editor.clear_edit_mode());
	}

	#[test]
	fn lost_endpoint_skips_handle_creation() {
		let store = store();
		let arc = arcs(&store).remove(0);
		let moved = EntityStore::new(vec![
			Entity::new("a").with_geo(0.0, 0.0).with_link(Link::new("b", "x")),
			Entity::new("b"),
		]);
		let mut editor = LinkEditor::new();
		assert_eq!(editor.select_arc(&arc, &moved), SelectOutcome::Skipped);
		assert!(editor.handle().is_none());
	}

	#[test]
	fn revalidate_stays_on_the_selected_parallel_link() {
		let parallel = || {
			EntityStore::new(vec![
				Entity::new("a")
					.with_geo(0.0, 0.0)
					.with_link(Link::new("b", "first"))
					.with_link(Link::new("b", "second")),
				Entity::new("b").with_geo(1.0, 1.0),
			])
		};
		let store = parallel();
		let second = arcs(&store)
			.into_iter()
			.find(|arc| arc.link.link == 1)
			.expect("second arc");
		let mut editor = LinkEditor::new();
		editor.select_arc(&second, &store);

		let mut refreshed = parallel();
		assert!(editor.revalidate(&refreshed));
		assert!(editor.drag_handle(&mut refreshed, [0.9, 0.1], |_| {}));

		let links = &refreshed.get("a").expect("a").links;
		assert_eq!(links[0].custom_control_point, None);
		assert_eq!(links[1].custom_control_point, Some([0.9, 0.1]));
	}

	#[test]
	fn revalidate_falls_back_when_the_slot_changed_target() {
		let store = store();
		let mut editor = LinkEditor::new();
		editor.select_arc(&arcs(&store)[1], &store);

		let swapped = EntityStore::new(vec![
			Entity::new("a").with_geo(0.0, 0.0).with_link(Link::new("c", "x")),
			Entity::new("c").with_geo(0.0, 2.0),
		]);
		assert!(editor.revalidate(&swapped));
		assert_eq!(editor.handle().map(|h| h.link), Some(LinkRef { entity: 0, link: 0 }));
	}

	#[test]
	fn revalidate_keeps_or_drops_the_session() {
		let store = store();
		let mut editor = LinkEditor::new();
		editor.select_arc(&arcs(&store)[0], &store);
		let id = editor.handle().map(|h| h.id);

		// b moves; link now sits at index 1
		let reordered = EntityStore::new(vec![
			Entity::new("b").with_geo(2.0, 2.0),
			Entity::new("a")
				.with_geo(0.0, 0.0)
				.with_link(Link::new("c", "x"))
				.with_link(Link::new("b", "x")),
		]);
		assert!(editor.revalidate(&reordered));
		assert_eq!(editor.handle().map(|h| h.id), id);
		let handle = editor.handle().expect("handle");
		assert_eq!(handle.link, LinkRef { entity: 1, link: 1 });
		assert!((handle.position[0] - 0.6).abs() < 1e-12);
		assert!((handle.position[1] - 1.4).abs() < 1e-12);

		let without_b = EntityStore::new(vec![Entity::new("a").with_geo(0.0, 0.0)]);
		assert!(!editor.revalidate(&without_b));
		assert!(editor.handle().is_none());
	}
}
