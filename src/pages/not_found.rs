use leptos::prelude::*;

/// 404 page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<h1>"Nothing here"</h1>
		<p>"The page you asked for does not exist."</p>
		<a href="/">"Back to the map"</a>
	}
}
