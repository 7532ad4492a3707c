//! WebDriver BiDi mapper core.
//!
//! Mirrors browser state reported over CDP as BiDi objects and events, and
//! translates BiDi commands into CDP commands.
//!
//! - **Contexts**: [`NavigableContext`] per tab or frame, owned by the
//!   [`ContextRegistry`], with a per-context navigation state machine
//! - **Realms**: [`RealmRegistry`] tracks script execution contexts
//! - **Events**: [`EventManager`] fans BiDi events out to subscribed clients
//! - **Commands**: [`CommandProcessor`] routes `{id, method, params}` frames
//!
//! The core reaches the browser only through [`bidi_runtime::CdpClient`],
//! so it runs unchanged against a live connection or a scripted fake.
//!
//! # Example
//!
//! ```ignore
//! let (connection, cdp_events) = CdpConnection::new(WebSocketTransport::connect(url).await?);
//! let mapper = BidiMapper::from_connection(MapperConfig::default(), &connection);
//! tokio::spawn({ let connection = Arc::clone(&connection); async move { connection.run().await } });
//! mapper.init().await?;
//! mapper.run(cdp_events, BufReader::new(stdin()), stdout()).await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod mapper;
pub mod processor;
pub mod script;
pub mod state;
pub mod targets;

pub use config::MapperConfig;
pub use context::{CdpTarget, ContextRegistry, NavigableContext};
pub use error::{Error, Result};
pub use events::{ClientId, EventManager};
pub use mapper::BidiMapper;
pub use processor::CommandProcessor;
pub use script::{Realm, RealmFilter, RealmRegistry};
pub use state::MapperState;
pub use targets::{ClientFactory, TargetManager};
