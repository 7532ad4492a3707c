//! `browsingContext` module: command parameters, results, and event payloads.
//!
//! See <https://w3c.github.io/webdriver-bidi/#module-browsingContext>

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a navigable (tab, window, or frame).
pub type BrowsingContextId = String;

/// Identifier of one cross-document navigation (CDP loader id).
pub type NavigationId = String;

/// Serialized navigable, as returned by `getTree` and carried by
/// `contextCreated`/`contextDestroyed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
	pub context: BrowsingContextId,
	pub url: String,
	/// `None` when the depth limit stopped recursion.
	pub children: Option<Vec<Info>>,
	/// Absent on nested children; `Some(None)` serializes as `null` for top-level contexts.
	#[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
	pub parent: Option<Option<BrowsingContextId>>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Deserialize::deserialize(deserializer).map(Some)
}

/// Payload of navigation lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationInfo {
	pub context: BrowsingContextId,
	pub navigation: Option<NavigationId>,
	/// Milliseconds since the Unix epoch at which the mapper observed the event.
	pub timestamp: u64,
	pub url: String,
}

/// How long `navigate`/`reload` wait before returning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessState {
	#[default]
	None,
	Interactive,
	Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParameters {
	pub context: BrowsingContextId,
	pub url: String,
	#[serde(default)]
	pub wait: ReadinessState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigateResult {
	pub navigation: Option<NavigationId>,
	pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadParameters {
	pub context: BrowsingContextId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ignore_cache: Option<bool>,
	#[serde(default)]
	pub wait: ReadinessState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateType {
	Tab,
	Window,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParameters {
	#[serde(rename = "type")]
	pub kind: CreateType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reference_context: Option<BrowsingContextId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub background: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResult {
	pub context: BrowsingContextId,
}

/// Parameters of commands that only name a context (`close`, `activate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextParameters {
	pub context: BrowsingContextId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureScreenshotParameters {
	pub context: BrowsingContextId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub clip: Option<serde_json::Value>,
}

/// Base64-encoded payload returned by `captureScreenshot` and `print`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResult {
	pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
	Portrait,
	Landscape,
}

/// Margins in centimeters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintMarginParameters {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bottom: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub left: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub right: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub top: Option<f64>,
}

/// Paper size in centimeters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintPageParameters {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub height: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub width: Option<f64>,
}

/// One entry of `pageRanges`: either a page number or a `"a-b"` range string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageRange {
	Page(u64),
	Range(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintParameters {
	pub context: BrowsingContextId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub background: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub margin: Option<PrintMarginParameters>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub orientation: Option<Orientation>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page: Option<PrintPageParameters>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page_ranges: Option<Vec<PageRange>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scale: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shrink_to_fit: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
	pub width: u64,
	pub height: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetViewportParameters {
	pub context: BrowsingContextId,
	/// `None` (`null`) resets the viewport override.
	pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleUserPromptParameters {
	pub context: BrowsingContextId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub accept: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTreeParameters {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_depth: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub root: Option<BrowsingContextId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetTreeResult {
	pub contexts: Vec<Info>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPromptType {
	Alert,
	Confirm,
	Prompt,
	Beforeunload,
}

impl UserPromptType {
	/// Maps a CDP `Page.DialogType` string.
	pub fn from_cdp(kind: &str) -> Option<Self> {
		match kind {
			"alert" => Some(Self::Alert),
			"confirm" => Some(Self::Confirm),
			"prompt" => Some(Self::Prompt),
			"beforeunload" => Some(Self::Beforeunload),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPromptOpenedParameters {
	pub context: BrowsingContextId,
	#[serde(rename = "type")]
	pub kind: UserPromptType,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptClosedParameters {
	pub context: BrowsingContextId,
	pub accepted: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_text: Option<String>,
}
