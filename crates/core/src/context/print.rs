//! `browsingContext.print` parameter translation.
//!
//! BiDi lengths are centimeters; `Page.printToPDF` wants inches. Values the
//! client left out stay out so the browser applies its own defaults.

use bidi_protocol::browsing_context::{Orientation, PageRange, PrintParameters};
use serde::Serialize;

use crate::error::{Error, Result};

/// Upper bound used for open-ended ranges such as `"5-"`.
pub const MAX_PAGE: u64 = 9_007_199_254_740_991;

const CM_PER_INCH: f64 = 2.54;

/// Browser message for a page whose margins leave no printable area.
pub const EMPTY_CONTENT_AREA: &str = "invalid print parameters: content area is empty";

/// `Page.printToPDF` parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintToPdfParams {
	pub print_background: bool,
	pub landscape: bool,
	#[serde(rename = "preferCSSPageSize")]
	pub prefer_css_page_size: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scale: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub margin_top: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub margin_bottom: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub margin_left: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub margin_right: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paper_width: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paper_height: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub page_ranges: Option<String>,
}

fn to_inches(cm: Option<f64>) -> Option<f64> {
	cm.map(|value| value / CM_PER_INCH)
}

pub fn to_cdp_params(params: &PrintParameters) -> Result<PrintToPdfParams> {
	let margin = params.margin.clone().unwrap_or_default();
	let page = params.page.clone().unwrap_or_default();

	let page_ranges = match &params.page_ranges {
		Some(ranges) if !ranges.is_empty() => {
			let mut parts = Vec::with_capacity(ranges.len());
			for range in ranges {
				parse_page_range(range)?;
				parts.push(match range {
					PageRange::Page(page) => page.to_string(),
					PageRange::Range(text) => text.clone(),
				});
			}
			Some(parts.join(","))
		}
		_ => None,
	};

	Ok(PrintToPdfParams {
		print_background: params.background.unwrap_or(false),
		landscape: params.orientation == Some(Orientation::Landscape),
		prefer_css_page_size: !params.shrink_to_fit.unwrap_or(true),
		scale: params.scale,
		margin_top: to_inches(margin.top),
		margin_bottom: to_inches(margin.bottom),
		margin_left: to_inches(margin.left),
		margin_right: to_inches(margin.right),
		paper_width: to_inches(page.width),
		paper_height: to_inches(page.height),
		page_ranges,
	})
}

/// Validates one `pageRanges` entry and returns its inclusive bounds.
pub fn parse_page_range(range: &PageRange) -> Result<(u64, u64)> {
	let text = match range {
		PageRange::Page(page) => return Ok((*page, *page)),
		PageRange::Range(text) => text.as_str(),
	};

	let bounds: Vec<&str> = text.split('-').collect();
	match bounds.as_slice() {
		[page] => {
			let page = parse_integer(page, text)?;
			Ok((page, page))
		}
		[lower, upper] => {
			let lower = match lower.trim() {
				"" => 1,
				value => parse_integer(value, text)?,
			};
			let upper = match upper.trim() {
				"" => MAX_PAGE,
				value => parse_integer(value, text)?,
			};
			if lower > upper {
				return Err(Error::InvalidArgument(format!(
					"Invalid page range: {lower} > {upper}"
				)));
			}
			Ok((lower, upper))
		}
		_ => Err(Error::InvalidArgument(format!(
			"Invalid page range: {text} is not a valid integer range"
		))),
	}
}

fn parse_integer(value: &str, range: &str) -> Result<u64> {
	let value = value.trim();
	if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
		return Err(Error::InvalidArgument(format!(
			"Invalid page range: {range} is not a valid integer range"
		)));
	}
	value
		.parse()
		.map_err(|_| Error::InvalidArgument(format!("Invalid page range: {value} is out of range")))
}

#[cfg(test)]
mod tests {
	use bidi_protocol::browsing_context::{PrintMarginParameters, PrintPageParameters};
	use serde_json::json;

	use super::*;

	fn range(text: &str) -> PageRange {
		PageRange::Range(text.to_string())
	}

	fn params() -> PrintParameters {
		serde_json::from_value(json!({"context": "A"})).unwrap()
	}

	#[test]
	fn test_page_range_bounds() {
		assert_eq!(parse_page_range(&range("3-5")).unwrap(), (3, 5));
		assert_eq!(parse_page_range(&range("-5")).unwrap(), (1, 5));
		assert_eq!(parse_page_range(&range("5-")).unwrap(), (5, MAX_PAGE));
		assert_eq!(parse_page_range(&range(" 2 - 4 ")).unwrap(), (2, 4));
		assert_eq!(parse_page_range(&range("7")).unwrap(), (7, 7));
		assert_eq!(parse_page_range(&PageRange::Page(4)).unwrap(), (4, 4));
		assert_eq!(parse_page_range(&range("-")).unwrap(), (1, MAX_PAGE));
	}

	#[test]
	fn test_invalid_page_ranges() {
		for bad in ["5-3", "1-2-3", "a", "1-b", "", "+3", "3.5"] {
			let err = parse_page_range(&range(bad)).unwrap_err();
			assert!(matches!(err, Error::InvalidArgument(_)), "{bad:?} should be rejected");
		}
	}

	#[test]
	fn test_defaults_leave_sizes_to_browser() {
		let cdp = to_cdp_params(&params()).unwrap();
		assert_eq!(
			serde_json::to_value(&cdp).unwrap(),
			json!({"printBackground": false, "landscape": false, "preferCSSPageSize": false})
		);
	}

	#[test]
	fn test_units_converted_when_present() {
		let mut params = params();
		params.margin = Some(PrintMarginParameters {
			top: Some(2.54),
			..Default::default()
		});
		params.page = Some(PrintPageParameters {
			width: Some(25.4),
			height: None,
		});
		params.orientation = Some(Orientation::Landscape);
		params.shrink_to_fit = Some(false);
		params.scale = Some(1.5);

		let cdp = to_cdp_params(&params).unwrap();
		assert_eq!(cdp.margin_top, Some(1.0));
		assert_eq!(cdp.margin_bottom, None);
		assert!((cdp.paper_width.unwrap() - 10.0).abs() < 1e-9);
		assert_eq!(cdp.paper_height, None);
		assert!(cdp.landscape);
		assert!(cdp.prefer_css_page_size);
		assert_eq!(cdp.scale, Some(1.5));
	}

	#[test]
	fn test_page_ranges_joined() {
		let mut params = params();
		params.page_ranges = Some(vec![PageRange::Page(1), range("3-5"), range("8-")]);
		assert_eq!(to_cdp_params(&params).unwrap().page_ranges.as_deref(), Some("1,3-5,8-"));

		params.page_ranges = Some(vec![range("5-3")]);
		assert!(to_cdp_params(&params).is_err());
	}
}
