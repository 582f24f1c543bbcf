//! Session-facing transport adapter
//!
//! [`SessionHub`] owns the session store and turns [`ClientEvent`]s into
//! engine work on the shared bridge, reporting back through a [`Notifier`].
//!
//! ```rust,ignore
//! let hub = SessionHub::builder(bridge, config, provider, notifier)
//!     .with_model(ProviderModelConfig::new("gpt-4.1").with_api_key(key))
//!     .build();
//!
//! hub.handle("sid", ClientEvent::Connect)?;
//! hub.handle("sid", ClientEvent::Initialize { selected_server_ids: vec!["weather".into()] })?;
//! ```

mod error;
mod events;
mod notifier;
mod service;
mod store;

pub use error::{HubError, HubResult};
pub use events::{ClientEvent, Notification};
pub use notifier::{LoggingNotifier, Notifier, RecordingNotifier};
pub use service::{Dispatch, SessionHub, SessionHubBuilder};
pub use store::{SessionHandle, SessionStore};
