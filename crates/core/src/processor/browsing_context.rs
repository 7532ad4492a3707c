//! `browsingContext.*` commands.

use std::sync::Arc;

use bidi_protocol::EmptyResult;
use bidi_protocol::browsing_context::{
	CaptureScreenshotParameters, ContextParameters, CreateParameters, CreateResult, CreateType, DataResult,
	GetTreeParameters, GetTreeResult, HandleUserPromptParameters, NavigateParameters, NavigateResult,
	PrintParameters, ReloadParameters, SetViewportParameters,
};
use serde::Deserialize;
use serde_json::json;

use super::CommandProcessor;
use crate::context::NavigableContext;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTargetResponse {
	target_id: String,
}

impl CommandProcessor {
	fn context(&self, id: &str) -> Result<Arc<NavigableContext>> {
		self.shared.contexts.get(id)
	}

	fn top_level_context(&self, id: &str, command: &str) -> Result<Arc<NavigableContext>> {
		let context = self.context(id)?;
		if !context.is_top_level() {
			return Err(Error::InvalidArgument(format!(
				"{command} can only be used on top-level contexts, not on {id}"
			)));
		}
		Ok(context)
	}

	pub(super) async fn navigate(&self, params: NavigateParameters) -> Result<NavigateResult> {
		self.context(&params.context)?.navigate(&params.url, params.wait).await
	}

	pub(super) async fn reload(&self, params: ReloadParameters) -> Result<EmptyResult> {
		self.context(&params.context)?
			.reload(params.ignore_cache, params.wait)
			.await?;
		Ok(EmptyResult {})
	}

	pub(super) async fn create(&self, params: CreateParameters) -> Result<CreateResult> {
		if let Some(reference) = &params.reference_context {
			self.top_level_context(reference, "referenceContext")?;
		}

		let response: CreateTargetResponse = self
			.browser
			.send(
				"Target.createTarget",
				json!({
					"url": "about:blank",
					"newWindow": params.kind == CreateType::Window,
					"background": params.background.unwrap_or(false),
				}),
			)
			.await?;

		let context = self
			.shared
			.contexts
			.wait_for(&response.target_id, self.shared.config.context_timeout)
			.await?;
		context.target().unblocked().await;
		context.revalidate()?;

		Ok(CreateResult {
			context: context.id().to_string(),
		})
	}

	pub(super) async fn close(&self, params: ContextParameters) -> Result<EmptyResult> {
		let context = self.top_level_context(&params.context, "close")?;
		context.close().await?;
		Ok(EmptyResult {})
	}

	pub(super) async fn activate(&self, params: ContextParameters) -> Result<EmptyResult> {
		let context = self.top_level_context(&params.context, "activate")?;
		context.activate().await?;
		Ok(EmptyResult {})
	}

	pub(super) async fn capture_screenshot(&self, params: CaptureScreenshotParameters) -> Result<DataResult> {
		if params.clip.is_some() {
			return Err(Error::UnsupportedOperation("Screenshot clipping is not supported".to_string()));
		}
		let data = self.context(&params.context)?.capture_screenshot().await?;
		Ok(DataResult { data })
	}

	pub(super) async fn print(&self, params: PrintParameters) -> Result<DataResult> {
		let data = self.context(&params.context)?.print(&params).await?;
		Ok(DataResult { data })
	}

	pub(super) async fn set_viewport(&self, params: SetViewportParameters) -> Result<EmptyResult> {
		let context = self.context(&params.context)?;
		if !context.is_top_level() {
			return Err(Error::UnsupportedOperation(
				"Setting viewport of non-top level context is not supported".to_string(),
			));
		}
		context.set_viewport(params.viewport).await?;
		Ok(EmptyResult {})
	}

	pub(super) async fn handle_user_prompt(&self, params: HandleUserPromptParameters) -> Result<EmptyResult> {
		self.context(&params.context)?
			.handle_user_prompt(params.accept, params.user_text)
			.await?;
		Ok(EmptyResult {})
	}

	pub(super) fn get_tree(&self, params: GetTreeParameters) -> Result<GetTreeResult> {
		let contexts = self
			.shared
			.contexts
			.get_tree(params.root.as_deref(), params.max_depth)?;
		Ok(GetTreeResult { contexts })
	}
}
