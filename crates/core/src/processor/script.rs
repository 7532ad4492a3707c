//! `script.*` commands.

use bidi_protocol::script::{GetRealmsParameters, GetRealmsResult};

use super::CommandProcessor;
use crate::error::Result;
use crate::script::RealmFilter;

impl CommandProcessor {
	pub(super) fn get_realms(&self, params: GetRealmsParameters) -> Result<GetRealmsResult> {
		let mut filter = RealmFilter::default().with_type(params.kind);
		if let Some(context) = params.context {
			self.shared.contexts.get(&context)?;
			filter = RealmFilter {
				context_id: Some(context),
				..filter
			};
		}
		let realms = self
			.shared
			.realms
			.find_realms(&filter)
			.iter()
			.map(|realm| realm.info())
			.collect();
		Ok(GetRealmsResult { realms })
	}
}
