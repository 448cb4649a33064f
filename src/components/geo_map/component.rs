use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::Receiver;

use leptos::prelude::*;
use log::{debug, error};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::error::GeoMapError;
use super::layers::RenderSurface;
use super::orchestrator::{MapCommand, MapConfig, MapEvent, MapRenderer};
use super::render::{CanvasSurface, Pick, pick};
use super::types::{ArcKey, Entity};
use super::viewport::{ViewState, Viewport};

/// Wheel notch size in zoom levels.
const WHEEL_ZOOM_STEP: f64 = 0.25;
/// Pointer travel (px) below which a press counts as a click.
const CLICK_TOLERANCE: f64 = 3.0;

#[derive(Clone, Debug, Default)]
enum Gesture {
	#[default]
	None,
	DragHandle,
	Pan {
		last_x: f64,
		last_y: f64,
		travelled: f64,
	},
}

type Renderer = MapRenderer<CanvasSurface>;
type SharedClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Ends `finished` and collects what the host should hear about. `view` is
/// the camera at the moment the pointer let go.
///
/// Only a mouseup can turn a short pan into a background click.
fn finish_gesture<S: RenderSurface>(
	r: &mut MapRenderer<S>,
	finished: Gesture,
	released: bool,
	view: ViewState,
) -> (Vec<MapEvent>, Option<Vec<Entity>>) {
	match finished {
		Gesture::Pan { travelled, .. } if released && travelled < CLICK_TOLERANCE => {
			r.on_background_click()
		}
		Gesture::Pan { .. } => r.on_view_settled(view),
		Gesture::DragHandle | Gesture::None => {}
	}
	let events = r.take_events();
	// the host persists edits, so hand it the updated collection once per drag
	let snapshot: Option<Vec<Entity>> = events
		.iter()
		.any(|e| matches!(e, MapEvent::LinkEdited { .. }))
		.then(|| r.store().iter().map(|(_, e)| e.clone()).collect());
	(events, snapshot)
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn canvas_size(canvas: &HtmlCanvasElement, window: &Window, fullscreen: bool, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
	if fullscreen {
		let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
		return (
			dim(window.inner_width()).unwrap_or(800.0),
			dim(window.inner_height()).unwrap_or(600.0),
		);
	}
	(
		width.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

/// Interactive map of entities and their relations.
///
/// Arcs can be clicked to reveal a handle that bends the curve; dragging it
/// writes the control point back into the entity's link.
///
/// Edits live in the map's own copy of `entities` until the host takes them
/// over: `on_link_edit` receives the full updated collection after each drag
/// and should write it back into the `entities` source. Otherwise the next
/// change to `entities`, `group_by` or `category_colors` reverts the curves.
#[component]
pub fn GeoLinkCanvas(
	#[prop(into)] entities: Signal<Vec<Entity>>,
	#[prop(into, default = Signal::derive(|| None))] group_by: Signal<Option<String>>,
	#[prop(into, default = Signal::derive(HashMap::new))] category_colors: Signal<
		HashMap<String, String>,
	>,
	#[prop(optional)] commands: Option<Receiver<MapCommand>>,
	#[prop(optional)] on_entity_select: Option<Callback<String>>,
	#[prop(optional)] on_arc_select: Option<Callback<Option<ArcKey>>>,
	#[prop(optional)] on_link_edit: Option<Callback<Vec<Entity>>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<Renderer>>> = Rc::new(RefCell::new(None));
	let gesture: Rc<RefCell<Gesture>> = Rc::new(RefCell::new(Gesture::None));
	let frame: SharedClosure = Rc::new(RefCell::new(None));
	let frame_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let resize_cb: SharedClosure = Rc::new(RefCell::new(None));
	let commands = Rc::new(RefCell::new(commands));

	// Hands queued renderer events to the host after the borrow is released.
	let dispatch = move |events: Vec<MapEvent>, snapshot: Option<Vec<Entity>>| {
		for event in events {
			match event {
				MapEvent::EntitySelected(id) => {
					if let Some(cb) = on_entity_select {
						cb.run(id);
					}
				}
				MapEvent::ArcSelected(arc) => {
					if let Some(cb) = on_arc_select {
						cb.run(Some(arc));
					}
				}
				MapEvent::EditCleared => {
					if let Some(cb) = on_arc_select {
						cb.run(None);
					}
				}
				MapEvent::LinkEdited { .. } => {}
			}
		}
		if let (Some(cb), Some(entities)) = (on_link_edit, snapshot) {
			cb.run(entities);
		}
	};

	let (state_init, frame_init, resize_init) = (state.clone(), frame.clone(), resize_cb.clone());
	let id_init = frame_id.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("{}", GeoMapError::NoWindow);
			return;
		};

		let (w, h) = canvas_size(&canvas, &window, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let config = MapConfig::default();
		let viewport = Viewport::new(config.initial_view, w, h);
		let surface = match CanvasSurface::new(&canvas, viewport) {
			Ok(surface) => surface,
			Err(err) => {
				error!("map disabled: {err}");
				return;
			}
		};
		let mut renderer = MapRenderer::new(surface, config, commands.borrow_mut().take());
		renderer.set_data(
			entities.get_untracked(),
			group_by.get_untracked(),
			category_colors.get_untracked(),
		);
		*state_init.borrow_mut() = Some(renderer);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = canvas_size(&canvas_resize, &win, true, None, None);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut r) = *state_resize.borrow_mut() {
					r.surface_mut().viewport.resize(nw, nh);
					r.redraw();
				}
			}));
			if let Some(ref cb) = *resize_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		// Commands arrive from outside the event handlers, so poll each frame.
		let (state_frame, frame_inner, id_frame) =
			(state_init.clone(), frame_init.clone(), id_init.clone());
		*frame_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut r) = *state_frame.borrow_mut() {
				r.pump_commands();
			}
			if let (Some(cb), Some(win)) = (frame_inner.borrow().as_ref(), web_sys::window()) {
				id_frame.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *frame_init.borrow() {
			id_init.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	// The frame closure holds its own cell, so the loop only stops once the
	// closure is dropped here.
	let owned = SendWrapper::new((state.clone(), frame.clone(), frame_id.clone(), resize_cb.clone()));
	on_cleanup(move || {
		let (state, frame, frame_id, resize_cb) = owned.take();
		let window = web_sys::window();
		if let (Some(win), Some(id)) = (window.as_ref(), frame_id.take()) {
			let _ = win.cancel_animation_frame(id);
		}
		*frame.borrow_mut() = None;
		if let (Some(win), Some(cb)) = (window.as_ref(), resize_cb.borrow_mut().take()) {
			let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
		if let Some(mut r) = state.borrow_mut().take() {
			r.teardown();
		}
		debug!("map view unmounted");
	});

	let state_data = state.clone();
	Effect::new(move |_| {
		let (list, column, table) = (entities.get(), group_by.get(), category_colors.get());
		if let Some(ref mut r) = *state_data.borrow_mut() {
			r.set_data(list, column, table);
		}
	});

	let (state_md, gesture_md) = (state.clone(), gesture.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let events = {
			let mut guard = state_md.borrow_mut();
			let Some(r) = guard.as_mut() else {
				return;
			};
			let hit = pick(r.layers(), &r.surface().viewport, x, y);
			let next = match hit {
				Some(Pick::Handle) => Gesture::DragHandle,
				Some(Pick::Node(node)) => {
					r.on_node_click(&node);
					Gesture::None
				}
				Some(Pick::Arc(arc)) => {
					r.on_arc_click(&arc);
					Gesture::None
				}
				None => Gesture::Pan {
					last_x: x,
					last_y: y,
					travelled: 0.0,
				},
			};
			*gesture_md.borrow_mut() = next;
			r.take_events()
		};
		dispatch(events, None);
	};

	let (state_mm, gesture_mm) = (state.clone(), gesture.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut guard = state_mm.borrow_mut();
		let Some(r) = guard.as_mut() else {
			return;
		};
		match &mut *gesture_mm.borrow_mut() {
			Gesture::DragHandle => {
				let position = r.surface().viewport.unproject(x, y);
				r.on_handle_drag(position);
			}
			Gesture::Pan {
				last_x,
				last_y,
				travelled,
			} => {
				let (dx, dy) = (x - *last_x, y - *last_y);
				*travelled += dx.hypot(dy);
				(*last_x, *last_y) = (x, y);
				r.surface_mut().viewport.pan_by(dx, dy);
				r.redraw();
			}
			Gesture::None => {
				let hovered = match pick(r.layers(), &r.surface().viewport, x, y) {
					Some(Pick::Node(node)) => Some(node),
					_ => None,
				};
				r.on_node_hover(hovered.as_ref());
			}
		}
	};

	let (state_mu, gesture_mu) = (state.clone(), gesture.clone());
	let on_mouseup = move |_: MouseEvent| {
		let finished = std::mem::take(&mut *gesture_mu.borrow_mut());
		let (events, snapshot) = {
			let mut guard = state_mu.borrow_mut();
			let Some(r) = guard.as_mut() else {
				return;
			};
			let view = r.surface().viewport.view();
			finish_gesture(r, finished, true, view)
		};
		dispatch(events, snapshot);
	};

	let (state_ml, gesture_ml) = (state.clone(), gesture.clone());
	let on_mouseleave = move |_: MouseEvent| {
		let finished = std::mem::take(&mut *gesture_ml.borrow_mut());
		let (events, snapshot) = {
			let mut guard = state_ml.borrow_mut();
			let Some(r) = guard.as_mut() else {
				return;
			};
			r.on_node_hover(None);
			let view = r.surface().viewport.view();
			finish_gesture(r, finished, false, view)
		};
		dispatch(events, snapshot);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut r) = *state_wh.borrow_mut() {
			let limits = r.config().zoom;
			let step = if ev.delta_y() > 0.0 { -WHEEL_ZOOM_STEP } else { WHEEL_ZOOM_STEP };
			let zoom = (r.surface().viewport.zoom + step).clamp(limits.min_zoom, limits.max_zoom);
			r.surface_mut().viewport.zoom_about(x, y, zoom);
			let view = r.surface().viewport.view();
			r.on_view_settled(view);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="geo-link-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::geo_map::layers::LayerSet;
	use crate::components::geo_map::types::Link;

	struct Blank;

	impl RenderSurface for Blank {
		fn set_layers(&mut self, _: &LayerSet) {}
	}

	fn editing() -> MapRenderer<Blank> {
		let config = MapConfig {
			initial_view: ViewState {
				center: [0.5, 0.5],
				zoom: 12.0,
			},
			..Default::default()
		};
		let mut r = MapRenderer::new(Blank, config, None);
		r.set_entities(vec![
			Entity::new("a").with_geo(0.0, 0.0).with_link(Link::new("b", "x")),
			Entity::new("b").with_geo(1.0, 1.0),
		]);
		let arc = r.build_arc_data().remove(0);
		r.on_arc_click(&arc);
		r.take_events();
		r
	}

	#[test]
	fn leaving_mid_drag_still_hands_over_the_edit() {
		let mut r = editing();
		assert!(r.on_handle_drag([0.2, 0.8]));
		let view = r.view();

		let (events, snapshot) = finish_gesture(&mut r, Gesture::DragHandle, false, view);
		assert!(events.iter().any(|e| matches!(e, MapEvent::LinkEdited { .. })));
		let snapshot = snapshot.expect("snapshot");
		assert_eq!(snapshot[0].links[0].custom_control_point, Some([0.2, 0.8]));
		assert!(r.take_events().is_empty());
	}

	#[test]
	fn short_pan_is_a_click_only_on_release() {
		let pan = || Gesture::Pan {
			last_x: 0.0,
			last_y: 0.0,
			travelled: 1.0,
		};
		let mut r = editing();
		let view = r.view();

		let (events, snapshot) = finish_gesture(&mut r, pan(), false, view);
		assert!(events.is_empty());
		assert!(snapshot.is_none());
		assert!(r.editor().handle().is_some());

		let (events, _) = finish_gesture(&mut r, pan(), true, view);
		assert_eq!(events, vec![MapEvent::EditCleared]);
	}
}
