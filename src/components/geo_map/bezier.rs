//! Quadratic bezier sampling for curved arcs.

use super::color::{Rgba, interpolate};
use super::types::LngLat;

/// Default number of segments per arc.
pub const DEFAULT_STEPS: usize = 30;

/// Perpendicular offset of the default control point, as a fraction of the
/// raw coordinate delta.
pub const CURVE_OFFSET: f64 = 0.2;

/// Sampled curve: `steps + 1` points and a color for each of them.
#[derive(Clone, Debug, PartialEq)]
pub struct BezierPath {
	/// Sampled points, `start` first.
	pub path: Vec<LngLat>,
	/// Gradient color for each point.
	pub colors: Vec<Rgba>,
	/// Control point that was used.
	pub control_point: LngLat,
}

/// Control point used when the user has not dragged one.
///
/// Midpoint of the chord pushed sideways by [`CURVE_OFFSET`] of the chord
/// vector. Works in raw lng/lat space, not along a geodesic.
pub fn default_control_point(start: LngLat, end: LngLat) -> LngLat {
	let mid = [(start[0] + end[0]) / 2.0, (start[1] + end[1]) / 2.0];
	let (dx, dy) = (end[0] - start[0], end[1] - start[1]);
	[mid[0] - dy * CURVE_OFFSET, mid[1] + dx * CURVE_OFFSET]
}

/// Picks the custom control point if present, otherwise the default one.
pub fn resolve_control_point(start: LngLat, end: LngLat, custom: Option<LngLat>) -> LngLat {
	custom.unwrap_or_else(|| default_control_point(start, end))
}

/// Point on the quadratic curve `start -> control -> end` at `t`.
pub fn point_at(start: LngLat, control: LngLat, end: LngLat, t: f64) -> LngLat {
	let mt = 1.0 - t;
	let (a, b, c) = (mt * mt, 2.0 * mt * t, t * t);
	[
		a * start[0] + b * control[0] + c * end[0],
		a * start[1] + b * control[1] + c * end[1],
	]
}

/// Samples the arc from `start` to `end` with a color gradient between the
/// endpoint colors.
///
/// Always yields `steps + 1` samples; `steps == 0` gives just `start`.
pub fn calculate_bezier_path(
	start: LngLat,
	end: LngLat,
	start_color: Rgba,
	end_color: Rgba,
	custom_control_point: Option<LngLat>,
	steps: usize,
) -> BezierPath {
	let control_point = resolve_control_point(start, end, custom_control_point);
	if steps == 0 {
		return BezierPath {
			path: vec![start],
			colors: vec![start_color],
			control_point,
		};
	}

	let (path, colors): (Vec<LngLat>, Vec<Rgba>) = (0..=steps)
		.map(|i| {
			let t = i as f64 / steps as f64;
			(
				point_at(start, control_point, end, t),
				interpolate(&start_color, &end_color, t),
			)
		})
		.unzip();

	BezierPath {
		path,
		colors,
		control_point,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const RED: Rgba = [255, 0, 0, 255];
	const BLUE: Rgba = [0, 0, 255, 255];

	fn close(a: LngLat, b: LngLat) -> bool {
		(a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
	}

	#[test]
	fn default_control_point_is_offset_from_midpoint() {
		let cp = default_control_point([0.0, 0.0], [1.0, 1.0]);
		assert!(close(cp, [0.3, 0.7]));
	}

	#[test]
	fn custom_control_point_is_used_verbatim() {
		let arc = calculate_bezier_path(
			[120.0, 30.0],
			[121.0, 31.0],
			RED,
			BLUE,
			Some([125.0, 25.0]),
			DEFAULT_STEPS,
		);
		assert_eq!(arc.control_point, [125.0, 25.0]);
		let mid = arc.path[DEFAULT_STEPS / 2];
		assert!(close(mid, [122.75, 27.75]));
	}

	#[test]
	fn gradient_runs_from_start_to_end_color() {
		let arc = calculate_bezier_path([0.0, 0.0], [1.0, 0.0], RED, BLUE, None, 2);
		assert_eq!(arc.colors, vec![RED, [128, 0, 128, 255], BLUE]);
	}

	#[test]
	fn zero_steps_yields_only_the_start() {
		let arc = calculate_bezier_path([0.0, 0.0], [2.0, 2.0], RED, BLUE, None, 0);
		assert_eq!(arc.path, vec![[0.0, 0.0]]);
		assert_eq!(arc.colors, vec![RED]);
		assert!(arc.path[0].iter().all(|v| v.is_finite()));
	}

	proptest! {
		#[test]
		fn sample_count_is_steps_plus_one(steps in 0usize..200) {
			let arc = calculate_bezier_path([3.0, 4.0], [-5.0, 8.0], RED, BLUE, None, steps);
			prop_assert_eq!(arc.path.len(), steps + 1);
			prop_assert_eq!(arc.colors.len(), steps + 1);
		}

		#[test]
		fn endpoints_are_preserved(
			sx in -180.0f64..180.0, sy in -85.0f64..85.0,
			ex in -180.0f64..180.0, ey in -85.0f64..85.0,
			steps in 1usize..64,
		) {
			let arc = calculate_bezier_path([sx, sy], [ex, ey], RED, BLUE, None, steps);
			prop_assert!(close(arc.path[0], [sx, sy]));
			prop_assert!(close(arc.path[steps], [ex, ey]));
			prop_assert_eq!(arc.colors[0], RED);
			prop_assert_eq!(arc.colors[steps], BLUE);
		}
	}
}
