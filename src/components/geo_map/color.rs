//! Hex parsing and RGBA interpolation.

use super::error::GeoMapError;

/// Four 0-255 channels: red, green, blue, alpha.
pub type Rgba = [u8; 4];

/// Neutral gray used whenever a color string cannot be read.
pub const FALLBACK_GRAY: [u8; 3] = [153, 153, 153];

/// Strict `#rrggbb` parser.
pub fn parse_hex(hex: &str, alpha: u8) -> Result<Rgba, GeoMapError> {
	let invalid = || GeoMapError::InvalidHexColor(hex.to_string());
	let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
	if digits.len() != 6 || !digits.is_ascii() {
		return Err(invalid());
	}

	let channel = |range: std::ops::Range<usize>| {
		u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
	};
	Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?, alpha])
}

/// Converts `#rrggbb` into RGBA, falling back to neutral gray on any bad input.
pub fn hex_to_color(hex: &str, alpha: u8) -> Rgba {
	parse_hex(hex, alpha).unwrap_or([FALLBACK_GRAY[0], FALLBACK_GRAY[1], FALLBACK_GRAY[2], alpha])
}

/// Per-channel linear blend of `a` towards `b`.
///
/// Channels missing from either slice count as 0 for RGB and 255 for alpha.
/// `t` is not clamped; callers pass values in `[0, 1]`.
pub fn interpolate(a: &[u8], b: &[u8], t: f64) -> Rgba {
	let mut out = [0u8; 4];
	for (i, slot) in out.iter_mut().enumerate() {
		let default = if i == 3 { 255.0 } else { 0.0 };
		let from = a.get(i).map_or(default, |&c| c as f64);
		let to = b.get(i).map_or(default, |&c| c as f64);
		// round half up, matching browser color math
		let value = (from + (to - from) * t + 0.5).floor();
		*slot = value.clamp(0.0, 255.0) as u8;
	}
	out
}

/// Formats a color as a CSS `rgba()` string for canvas drawing.
pub fn to_css(color: Rgba) -> String {
	format!(
		"rgba({}, {}, {}, {:.3})",
		color[0],
		color[1],
		color[2],
		color[3] as f64 / 255.0
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn parses_six_digit_hex() {
		assert_eq!(hex_to_color("#FF5733", 200), [255, 87, 51, 200]);
		assert_eq!(hex_to_color("#0077b6", 255), [0, 119, 182, 255]);
	}

	#[test]
	fn malformed_hex_falls_back_to_gray() {
		assert_eq!(hex_to_color("not-a-color", 255), [153, 153, 153, 255]);
		assert_eq!(hex_to_color("", 255), [153, 153, 153, 255]);
		assert_eq!(hex_to_color("#12", 10), [153, 153, 153, 10]);
		assert_eq!(hex_to_color("#zzzzzz", 255), [153, 153, 153, 255]);
	}

	#[test]
	fn strict_parser_reports_the_input() {
		assert_eq!(
			parse_hex("blue", 255),
			Err(GeoMapError::InvalidHexColor("blue".into()))
		);
	}

	#[test]
	fn midpoint_of_red_and_blue_is_purple() {
		assert_eq!(
			interpolate(&[255, 0, 0, 255], &[0, 0, 255, 255], 0.5),
			[128, 0, 128, 255]
		);
	}

	#[test]
	fn missing_channels_use_defaults() {
		assert_eq!(interpolate(&[10, 20], &[10, 20, 30], 1.0), [10, 20, 30, 255]);
		assert_eq!(interpolate(&[], &[], 0.3), [0, 0, 0, 255]);
	}

	#[test]
	fn css_string_carries_alpha_fraction() {
		assert_eq!(to_css([1, 2, 3, 255]), "rgba(1, 2, 3, 1.000)");
	}

	proptest! {
		#[test]
		fn interpolation_hits_both_ends(a in any::<[u8; 4]>(), b in any::<[u8; 4]>()) {
			prop_assert_eq!(interpolate(&a, &b, 0.0), a);
			prop_assert_eq!(interpolate(&a, &b, 1.0), b);
		}
	}
}
