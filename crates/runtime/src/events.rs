//! Typed CDP events consumed by the mapper.
//!
//! Only the events the mapper reacts to get a dedicated variant; everything
//! else is preserved as [`CdpEvent::Other`] so listeners can still observe it.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

/// `Page.Frame` (subset).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
	pub id: String,
	#[serde(default)]
	pub parent_id: Option<String>,
	#[serde(default)]
	pub loader_id: Option<String>,
	pub url: String,
	#[serde(default)]
	pub url_fragment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrameNavigated {
	pub frame: Frame,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatedWithinDocument {
	pub frame_id: String,
	pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStartedLoading {
	pub frame_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
	pub frame_id: String,
	pub loader_id: String,
	/// `init`, `commit`, `DOMContentLoaded`, `load`, ...
	pub name: String,
	#[serde(default)]
	pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAttached {
	pub frame_id: String,
	pub parent_frame_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDetached {
	pub frame_id: String,
	/// `remove` or `swap`.
	#[serde(default)]
	pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuxData {
	#[serde(default)]
	pub frame_id: Option<String>,
	#[serde(default)]
	pub is_default: bool,
	/// `default`, `isolated`, or `worker`.
	#[serde(default, rename = "type")]
	pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextDescription {
	pub id: i64,
	#[serde(default)]
	pub origin: String,
	#[serde(default)]
	pub name: String,
	pub unique_id: String,
	#[serde(default)]
	pub aux_data: AuxData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecutionContextCreated {
	pub context: ExecutionContextDescription,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextDestroyed {
	pub execution_context_id: i64,
	#[serde(default)]
	pub execution_context_unique_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavascriptDialogOpening {
	#[serde(default)]
	pub url: String,
	pub message: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub default_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavascriptDialogClosed {
	pub result: bool,
	#[serde(default)]
	pub user_input: String,
}

/// `Target.TargetInfo` (subset).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	pub target_id: String,
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub opener_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedToTarget {
	pub session_id: String,
	pub target_info: TargetInfo,
	#[serde(default)]
	pub waiting_for_debugger: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedFromTarget {
	pub session_id: String,
	#[serde(default)]
	pub target_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfoChanged {
	pub target_info: TargetInfo,
}

/// A decoded CDP event.
#[derive(Debug, Clone, PartialEq)]
pub enum CdpEvent {
	FrameNavigated(FrameNavigated),
	NavigatedWithinDocument(NavigatedWithinDocument),
	FrameStartedLoading(FrameStartedLoading),
	LifecycleEvent(LifecycleEvent),
	FrameAttached(FrameAttached),
	FrameDetached(FrameDetached),
	ExecutionContextCreated(ExecutionContextCreated),
	ExecutionContextDestroyed(ExecutionContextDestroyed),
	ExecutionContextsCleared,
	JavascriptDialogOpening(JavascriptDialogOpening),
	JavascriptDialogClosed(JavascriptDialogClosed),
	AttachedToTarget(AttachedToTarget),
	DetachedFromTarget(DetachedFromTarget),
	TargetInfoChanged(TargetInfoChanged),
	Other { method: String, params: Value },
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T> {
	Ok(serde_json::from_value(params)?)
}

impl CdpEvent {
	/// Decodes an event from its method name and raw params.
	///
	/// Fails only when a known event carries params of the wrong shape.
	pub fn parse(method: &str, params: Value) -> Result<Self> {
		let event = match method {
			"Page.frameNavigated" => Self::FrameNavigated(decode(params)?),
			"Page.navigatedWithinDocument" => Self::NavigatedWithinDocument(decode(params)?),
			"Page.frameStartedLoading" => Self::FrameStartedLoading(decode(params)?),
			"Page.lifecycleEvent" => Self::LifecycleEvent(decode(params)?),
			"Page.frameAttached" => Self::FrameAttached(decode(params)?),
			"Page.frameDetached" => Self::FrameDetached(decode(params)?),
			"Page.javascriptDialogOpening" => Self::JavascriptDialogOpening(decode(params)?),
			"Page.javascriptDialogClosed" => Self::JavascriptDialogClosed(decode(params)?),
			"Runtime.executionContextCreated" => Self::ExecutionContextCreated(decode(params)?),
			"Runtime.executionContextDestroyed" => Self::ExecutionContextDestroyed(decode(params)?),
			"Runtime.executionContextsCleared" => Self::ExecutionContextsCleared,
			"Target.attachedToTarget" => Self::AttachedToTarget(decode(params)?),
			"Target.detachedFromTarget" => Self::DetachedFromTarget(decode(params)?),
			"Target.targetInfoChanged" => Self::TargetInfoChanged(decode(params)?),
			_ => Self::Other {
				method: method.to_string(),
				params,
			},
		};
		Ok(event)
	}

	/// Returns the CDP method name.
	pub fn method(&self) -> &str {
		match self {
			Self::FrameNavigated(_) => "Page.frameNavigated",
			Self::NavigatedWithinDocument(_) => "Page.navigatedWithinDocument",
			Self::FrameStartedLoading(_) => "Page.frameStartedLoading",
			Self::LifecycleEvent(_) => "Page.lifecycleEvent",
			Self::FrameAttached(_) => "Page.frameAttached",
			Self::FrameDetached(_) => "Page.frameDetached",
			Self::JavascriptDialogOpening(_) => "Page.javascriptDialogOpening",
			Self::JavascriptDialogClosed(_) => "Page.javascriptDialogClosed",
			Self::ExecutionContextCreated(_) => "Runtime.executionContextCreated",
			Self::ExecutionContextDestroyed(_) => "Runtime.executionContextDestroyed",
			Self::ExecutionContextsCleared => "Runtime.executionContextsCleared",
			Self::AttachedToTarget(_) => "Target.attachedToTarget",
			Self::DetachedFromTarget(_) => "Target.detachedFromTarget",
			Self::TargetInfoChanged(_) => "Target.targetInfoChanged",
			Self::Other { method, .. } => method,
		}
	}
}
