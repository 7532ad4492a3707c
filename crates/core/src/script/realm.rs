use bidi_protocol::browsing_context::BrowsingContextId;
use bidi_protocol::script::{RealmId, RealmInfo, RealmType};
use bidi_runtime::SessionId;

/// A script execution context owned by a navigable context.
#[derive(Debug, Clone, PartialEq)]
pub struct Realm {
	realm_id: RealmId,
	context_id: BrowsingContextId,
	execution_context_id: i64,
	origin: String,
	realm_type: RealmType,
	sandbox: Option<String>,
	cdp_session_id: SessionId,
}

impl Realm {
	pub fn new(
		realm_id: impl Into<RealmId>,
		context_id: impl Into<BrowsingContextId>,
		execution_context_id: i64,
		origin: &str,
		realm_type: RealmType,
		sandbox: Option<String>,
		cdp_session_id: SessionId,
	) -> Self {
		Self {
			realm_id: realm_id.into(),
			context_id: context_id.into(),
			execution_context_id,
			origin: normalize_origin(origin),
			realm_type,
			sandbox: sandbox.filter(|name| !name.is_empty()),
			cdp_session_id,
		}
	}

	pub fn realm_id(&self) -> &str {
		&self.realm_id
	}

	pub fn context_id(&self) -> &str {
		&self.context_id
	}

	pub fn execution_context_id(&self) -> i64 {
		self.execution_context_id
	}

	pub fn origin(&self) -> &str {
		&self.origin
	}

	pub fn realm_type(&self) -> RealmType {
		self.realm_type
	}

	/// `None` for the context's main world.
	pub fn sandbox(&self) -> Option<&str> {
		self.sandbox.as_deref()
	}

	pub fn cdp_session_id(&self) -> &SessionId {
		&self.cdp_session_id
	}

	pub fn info(&self) -> RealmInfo {
		RealmInfo {
			realm: self.realm_id.clone(),
			origin: self.origin.clone(),
			kind: self.realm_type,
			context: Some(self.context_id.clone()),
			sandbox: self.sandbox.clone(),
		}
	}
}

/// Opaque origins are reported as `"null"`.
fn normalize_origin(origin: &str) -> String {
	match origin {
		"" | "://" => "null".to_string(),
		other => other.to_string(),
	}
}
