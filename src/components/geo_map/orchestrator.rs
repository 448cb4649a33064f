//! Composition root: owns the layers and routes view events to the core.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{Receiver, TryRecvError};

use log::{debug, info};

use super::bezier::DEFAULT_STEPS;
use super::editor::{LinkEditor, SelectOutcome};
use super::layers::{HandleOverlay, LayerSet, PathLayer, PointLayer, RenderSurface};
use super::transform::{ColorScheme, MapDataTransformer};
use super::types::{ArcKey, Entity, EntityStore, LngLat, RenderArc, RenderNode};
use super::viewport::ViewState;
use super::zoom::{ZoomLevel, ZoomLevelConfig};

/// Zoom used by a fly-to command that does not name one.
pub const DEFAULT_FLY_TO_ZOOM: f64 = 14.0;

/// Settings fixed for the lifetime of a [`MapRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
	/// Level-of-detail thresholds.
	pub zoom: ZoomLevelConfig,
	/// Segments per arc.
	pub bezier_steps: usize,
	/// Camera at startup.
	pub initial_view: ViewState,
}

impl Default for MapConfig {
	fn default() -> Self {
		Self {
			zoom: ZoomLevelConfig::default(),
			bezier_steps: DEFAULT_STEPS,
			initial_view: ViewState {
				center: [108.0, 34.0],
				zoom: 4.0,
			},
		}
	}
}

/// Requests sent to the map from elsewhere in the host.
#[derive(Clone, Debug, PartialEq)]
pub enum MapCommand {
	/// Center on `lat`, `lng`; zoom defaults to [`DEFAULT_FLY_TO_ZOOM`].
	FlyTo {
		/// Target latitude.
		lat: f64,
		/// Target longitude.
		lng: f64,
		/// Target zoom, clamped to the configured range.
		zoom: Option<f64>,
	},
}

/// Things the host may want to react to, drained with [`MapRenderer::take_events`].
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
	/// A node was clicked.
	EntitySelected(String),
	/// An edit session opened on this arc.
	ArcSelected(ArcKey),
	/// The edit session ended.
	EditCleared,
	/// A drag frame wrote `control_point` into the arc's link.
	LinkEdited {
		/// Arc whose link changed.
		arc: ArcKey,
		/// New control point.
		control_point: LngLat,
	},
}

/// Keeps a [`RenderSurface`] in sync with entities, zoom and edit state.
pub struct MapRenderer<S: RenderSurface> {
	surface: S,
	config: MapConfig,
	store: EntityStore,
	visible: Option<HashSet<String>>,
	colors: ColorScheme,
	hovered_id: Option<String>,
	zoom: ZoomLevel,
	view: ViewState,
	editor: LinkEditor,
	layers: LayerSet,
	commands: Option<Receiver<MapCommand>>,
	events: Vec<MapEvent>,
}

impl<S: RenderSurface> MapRenderer<S> {
	/// `commands` is the inbound channel for fly-to requests; pass `None` if the
	/// host never moves the camera programmatically.
	pub fn new(surface: S, config: MapConfig, commands: Option<Receiver<MapCommand>>) -> Self {
		let view = config.initial_view;
		Self {
			surface,
			zoom: ZoomLevel::new(config.zoom, view.zoom),
			config,
			store: EntityStore::default(),
			visible: None,
			colors: ColorScheme::default(),
			hovered_id: None,
			view,
			editor: LinkEditor::new(),
			layers: LayerSet::empty(),
			commands,
			events: Vec::new(),
		}
	}

	/// Rendering surface.
	pub fn surface(&self) -> &S {
		&self.surface
	}

	/// Rendering surface, for camera changes.
	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	/// Settings in use.
	pub fn config(&self) -> &MapConfig {
		&self.config
	}

	/// Entities as currently edited.
	pub fn store(&self) -> &EntityStore {
		&self.store
	}

	/// Level-of-detail policy.
	pub fn zoom(&self) -> &ZoomLevel {
		&self.zoom
	}

	/// Last settled view.
	pub fn view(&self) -> ViewState {
		self.view
	}

	/// Edit session.
	pub fn editor(&self) -> &LinkEditor {
		&self.editor
	}

	/// Layers most recently pushed to the surface.
	pub fn layers(&self) -> &LayerSet {
		&self.layers
	}

	/// Drains queued events.
	pub fn take_events(&mut self) -> Vec<MapEvent> {
		std::mem::take(&mut self.events)
	}

	/// Builds the current node set.
	pub fn build_node_data(&self) -> Vec<RenderNode> {
		self.transformer().build_node_data()
	}

	/// Builds the current arc set, regardless of zoom.
	pub fn build_arc_data(&self) -> Vec<RenderArc> {
		self.transformer().build_arc_data()
	}

	fn transformer(&self) -> MapDataTransformer<'_> {
		MapDataTransformer {
			store: &self.store,
			visible: self.visible.as_ref(),
			colors: &self.colors,
			hovered_id: self.hovered_id.as_deref(),
			steps: self.config.bezier_steps,
		}
	}

	/// Replaces the entity collection.
	///
	/// An open edit session survives only if its link and both endpoint
	/// positions survive.
	pub fn set_entities(&mut self, entities: Vec<Entity>) {
		self.replace_store(entities);
		self.rebuild_layers();
	}

	/// Replaces entities and colors together with a single rebuild.
	pub fn set_data(
		&mut self,
		entities: Vec<Entity>,
		group_by: Option<String>,
		category_colors: HashMap<String, String>,
	) {
		self.colors = ColorScheme {
			group_by,
			category_colors,
		};
		self.replace_store(entities);
		self.rebuild_layers();
	}

	fn replace_store(&mut self, entities: Vec<Entity>) {
		self.store = EntityStore::new(entities);
		if !self.editor.revalidate(&self.store) {
			self.events.push(MapEvent::EditCleared);
		}
	}

	/// Restricts which entities are drawn. `None` shows all of them.
	pub fn set_visible(&mut self, visible: Option<HashSet<String>>) {
		self.visible = visible;
		self.rebuild_layers();
	}

	/// Replaces grouping and colors.
	pub fn set_color_scheme(&mut self, group_by: Option<String>, category_colors: HashMap<String, String>) {
		self.colors = ColorScheme {
			group_by,
			category_colors,
		};
		self.rebuild_layers();
	}

	/// Zoom has settled; the policy is updated before anything is rebuilt.
	pub fn on_zoom_settled(&mut self, zoom: f64) {
		self.zoom.update_zoom(zoom);
		self.view.zoom = self.zoom.current_zoom();
		self.rebuild_layers();
	}

	/// Pan or zoom has ended.
	pub fn on_view_settled(&mut self, view: ViewState) {
		self.view.center = view.center;
		self.on_zoom_settled(view.zoom);
	}

	/// Pointer entered or left a node. Rebuilds at once so the hovered radius
	/// shows without waiting for another trigger.
	pub fn on_node_hover(&mut self, node: Option<&RenderNode>) {
		let id = node.map(|n| n.id.clone());
		if id == self.hovered_id {
			return;
		}
		self.hovered_id = id;
		self.rebuild_layers();
	}

	/// Reports the clicked entity.
	pub fn on_node_click(&mut self, node: &RenderNode) {
		self.events.push(MapEvent::EntitySelected(node.id.clone()));
	}

	/// Opens an edit session on `arc`.
	pub fn on_arc_click(&mut self, arc: &RenderArc) {
		match self.editor.select_arc(arc, &self.store) {
			SelectOutcome::Unchanged => {}
			SelectOutcome::Editing => {
				self.events.push(MapEvent::ArcSelected(arc.key()));
				self.rebuild_layers();
			}
			SelectOutcome::Skipped => self.rebuild_layers(),
		}
	}

	/// Click on empty map: ends any edit session.
	pub fn on_background_click(&mut self) {
		self.clear_edit_mode();
	}

	/// Ends the edit session, if one is open.
	pub fn clear_edit_mode(&mut self) {
		if self.editor.clear_edit_mode() {
			self.events.push(MapEvent::EditCleared);
			self.rebuild_layers();
		}
	}

	/// One drag frame: write the control point, then repaint synchronously.
	pub fn on_handle_drag(&mut self, position: LngLat) -> bool {
		let Some(arc) = self.editor.selected_arc().cloned() else {
			return false;
		};
		let Self {
			editor,
			store,
			surface,
			layers,
			zoom,
			visible,
			colors,
			hovered_id,
			config,
			..
		} = self;
		let dragged = editor.drag_handle(store, position, |store| {
			let pass = MapDataTransformer {
				store,
				visible: visible.as_ref(),
				colors: &*colors,
				hovered_id: hovered_id.as_deref(),
				steps: config.bezier_steps,
			};
			let handle = anchors_of(store, &arc).map(|anchors| HandleOverlay { position, anchors });
			*layers = compose_layers(&pass, &*zoom, handle);
			surface.set_layers(&*layers);
		});
		if dragged {
			self.events.push(MapEvent::LinkEdited {
				arc,
				control_point: position,
			});
		}
		dragged
	}

	/// Drains pending commands. Call once per frame.
	pub fn pump_commands(&mut self) {
		loop {
			let command = match self.commands.as_ref().map(Receiver::try_recv) {
				Some(Ok(command)) => command,
				Some(Err(TryRecvError::Disconnected)) => {
					self.commands = None;
					return;
				}
				Some(Err(TryRecvError::Empty)) | None => return,
			};
			self.handle_command(command);
		}
	}

	/// Applies one command right away.
	pub fn handle_command(&mut self, command: MapCommand) {
		match command {
			MapCommand::FlyTo { lat, lng, zoom } => {
				let zoom = zoom
					.unwrap_or(DEFAULT_FLY_TO_ZOOM)
					.clamp(self.config.zoom.min_zoom, self.config.zoom.max_zoom);
				info!("flying to {lat:.5}, {lng:.5} at zoom {zoom}");
				self.surface.fly_to([lng, lat], zoom);
				self.on_view_settled(ViewState {
					center: [lng, lat],
					zoom,
				});
			}
		}
	}

	/// Repaints the current layers without recomputing them.
	pub fn redraw(&mut self) {
		self.surface.set_layers(&self.layers);
	}

	/// Recomputes every layer and pushes it to the surface.
	pub fn rebuild_layers(&mut self) {
		let handle = self.handle_overlay();
		let layers = compose_layers(&self.transformer(), &self.zoom, handle);
		self.layers = layers;
		self.surface.set_layers(&self.layers);
	}

	fn handle_overlay(&self) -> Option<HandleOverlay> {
		let arc = self.editor.selected_arc()?;
		let handle = self.editor.handle()?;
		Some(HandleOverlay {
			position: handle.position,
			anchors: anchors_of(&self.store, arc)?,
		})
	}

	/// Ends any edit session and drops the command channel. Runs on drop.
	pub fn teardown(&mut self) {
		self.editor.clear_edit_mode();
		self.commands = None;
	}
}

impl<S: RenderSurface> Drop for MapRenderer<S> {
	fn drop(&mut self) {
		self.teardown();
	}
}

fn anchors_of(store: &EntityStore, arc: &ArcKey) -> Option<[LngLat; 2]> {
	let start = store.get(&arc.source_id)?.position()?;
	let end = store.get(&arc.target_id)?.position()?;
	Some([start, end])
}

fn compose_layers(pass: &MapDataTransformer<'_>, zoom: &ZoomLevel, handle: Option<HandleOverlay>) -> LayerSet {
	let nodes = pass.build_node_data();
	let paths = zoom
		.should_render_links()
		.then(|| PathLayer::new(pass.build_arc_data(), zoom.link_width_range()));
	debug!(
		"layers rebuilt at zoom {:.2}: {} nodes, {} arcs",
		zoom.current_zoom(),
		nodes.len(),
		paths.as_ref().map_or(0, |p| p.data.len())
	);
	LayerSet {
		points: PointLayer::new(nodes, zoom.node_pixel_range(), zoom.should_show_details()),
		paths,
		handle,
	}
}
