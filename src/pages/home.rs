use std::collections::HashMap;
use std::sync::mpsc;

use leptos::prelude::*;
use log::info;

use crate::components::geo_map::{ArcKey, Entity, GeoLinkCanvas, Link, MapCommand};

const KINDS: &[(&str, &str)] = &[
	("temple", "#d62728"),
	("market", "#2ca02c"),
	("gate", "#9467bd"),
	("Unknown", "#7f7f7f"),
];

/// Generate sample sites scattered around a city center, each linked to a few
/// earlier ones (deterministic, like a random tree).
fn generate_sample_data(n: usize) -> Vec<Entity> {
	let (lat0, lng0) = (34.26, 108.94);
	(0..n)
		.map(|i| {
			let (dx, dy) = (rand_simple(i) - 0.5, rand_simple(i + n) - 0.5);
			let mut entity = Entity::new(format!("site-{i}"))
				.with_label(format!("Site {i}"))
				.with_geo(lat0 + dy * 0.12, lng0 + dx * 0.16);
			if i % 7 != 0 {
				entity = entity.with_attribute("kind", KINDS[i % 3].0);
			}
			if i > 0 {
				let target = (rand_simple(i * 3) * i as f64) as usize;
				entity = entity.with_link(Link::new(format!("site-{target}"), "route"));
			}
			entity
		})
		.collect()
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let entities = RwSignal::new(generate_sample_data(40));
	let colors: HashMap<String, String> = KINDS
		.iter()
		.map(|(k, c)| (k.to_string(), c.to_string()))
		.collect();
	let selected_entity = RwSignal::new(None::<String>);
	let selected_arc = RwSignal::new(None::<ArcKey>);

	let (tx, rx) = mpsc::channel();
	let fly_home = move |_| {
		let _ = tx.send(MapCommand::FlyTo {
			lat: 34.26,
			lng: 108.94,
			zoom: Some(12.5),
		});
	};

	let on_entity_select = Callback::new(move |id: String| selected_entity.set(Some(id)));
	let on_arc_select = Callback::new(move |arc: Option<ArcKey>| selected_arc.set(arc));
	// Keep the edited curves: the map reloads from `entities` on every change.
	let on_link_edit = Callback::new(move |updated: Vec<Entity>| {
		info!("curve edited; {} entities updated", updated.len());
		entities.set(updated);
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-map">
				<GeoLinkCanvas
					entities=entities
					group_by=Signal::derive(|| Some("kind".to_string()))
					category_colors=Signal::derive(move || colors.clone())
					commands=rx
					on_entity_select=on_entity_select
					on_arc_select=on_arc_select
					on_link_edit=on_link_edit
					fullscreen=true
				/>
				<div class="map-overlay">
					<h1>"Relation Map"</h1>
					<p class="subtitle">
						"Scroll to zoom. Relations appear from zoom 10. Click a relation to bend it."
					</p>
					<button on:click=fly_home>"Fly to center"</button>
					<p>
						{move || selected_entity.get().map(|id| format!("Selected: {id}"))}
					</p>
					<p>
						{move || {
							selected_arc
								.get()
								.map(|arc| format!("Editing: {} → {}", arc.source_id, arc.target_id))
						}}
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
