//! Process-wide registries shared by contexts, targets, and command handlers.

use std::sync::Arc;

use crate::config::MapperConfig;
use crate::context::ContextRegistry;
use crate::events::EventManager;
use crate::script::RealmRegistry;

/// Everything a navigable context needs to reach besides its own session.
pub struct MapperState {
	pub config: MapperConfig,
	pub contexts: Arc<ContextRegistry>,
	pub realms: Arc<RealmRegistry>,
	pub events: Arc<EventManager>,
}

impl MapperState {
	pub fn new(config: MapperConfig) -> Arc<Self> {
		let contexts = Arc::new(ContextRegistry::new());
		let events = Arc::new(EventManager::new(Arc::clone(&contexts)));
		let realms = Arc::new(RealmRegistry::new(Arc::clone(&events)));
		Arc::new(Self {
			config,
			contexts,
			realms,
			events,
		})
	}
}
