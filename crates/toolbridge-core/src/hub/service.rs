//! Transport adapter: turns front-end events into engine work

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::{Bridge, BridgeError, Ticket};
use crate::config::ConfigProvider;
use crate::engine::{LoopOptions, Session, ToolLoop};
use crate::logging::{Logger, NoOpLogger};
use crate::mcp::{BackendConnector, McpConnector, DEFAULT_CLOSE_TIMEOUT};
use crate::providers::{Provider, ProviderModelConfig};
use crate::types::{BackendDescriptor, SessionStatus};

use super::error::{HubError, HubResult};
use super::events::{ClientEvent, Notification};
use super::notifier::Notifier;
use super::store::{SessionHandle, SessionStore};

/// Ticket for the asynchronous part of an event, if it had one
pub type Dispatch = Option<Ticket<()>>;

struct HubInner {
    store: SessionStore,
    bridge: Arc<Bridge>,
    config: Arc<dyn ConfigProvider>,
    connector: Arc<dyn BackendConnector>,
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    loop_options: LoopOptions,
    notifier: Arc<dyn Notifier>,
    close_timeout: Duration,
    logger: Arc<dyn Logger>,
}

/// Builder for [`SessionHub`]
pub struct SessionHubBuilder {
    bridge: Arc<Bridge>,
    config: Arc<dyn ConfigProvider>,
    provider: Arc<dyn Provider>,
    notifier: Arc<dyn Notifier>,
    connector: Option<Arc<dyn BackendConnector>>,
    model: ProviderModelConfig,
    loop_options: LoopOptions,
    close_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl SessionHubBuilder {
    /// Backend connector; defaults to real MCP connections
    pub fn with_connector(mut self, connector: Arc<dyn BackendConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_model(mut self, model: ProviderModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn with_loop_options(mut self, options: LoopOptions) -> Self {
        self.loop_options = options;
        self
    }

    /// Bound on closing each backend connection at teardown
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> SessionHub {
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(McpConnector::new(Arc::clone(&self.logger))));
        SessionHub {
            inner: Arc::new(HubInner {
                store: SessionStore::new(),
                bridge: self.bridge,
                config: self.config,
                connector,
                provider: self.provider,
                model: self.model,
                loop_options: self.loop_options,
                notifier: self.notifier,
                close_timeout: self.close_timeout,
                logger: self.logger,
            }),
        }
    }
}

/// Entry point for every session-facing event
///
/// [`handle`](Self::handle) runs the synchronous checks on the caller's
/// thread, reports rejections right away, and hands the I/O to the shared
/// [`Bridge`]. The returned ticket resolves once the event's last
/// notification has been sent.
#[derive(Clone)]
pub struct SessionHub {
    inner: Arc<HubInner>,
}

impl SessionHub {
    pub fn builder(
        bridge: Arc<Bridge>,
        config: Arc<dyn ConfigProvider>,
        provider: Arc<dyn Provider>,
        notifier: Arc<dyn Notifier>,
    ) -> SessionHubBuilder {
        SessionHubBuilder {
            bridge,
            config,
            provider,
            notifier,
            connector: None,
            model: ProviderModelConfig::new("gpt-4.1"),
            loop_options: LoopOptions::default(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            logger: NoOpLogger::shared(),
        }
    }

    /// Handle one event for one session
    ///
    /// A rejected event is also reported to the session as an `error`
    /// notification.
    pub fn handle(&self, session_id: &str, event: ClientEvent) -> HubResult<Dispatch> {
        let result = match event {
            ClientEvent::Connect => Ok(self.connect(session_id)),
            ClientEvent::Disconnect => self.disconnect(session_id),
            ClientEvent::RequestServerList => self.server_list(session_id).map(|_| None),
            ClientEvent::Initialize {
                selected_server_ids,
            } => self.initialize(session_id, &selected_server_ids).map(Some),
            ClientEvent::SendMessage { message } => self.send_message(session_id, message).map(Some),
            ClientEvent::ResetConversation => self.reset_conversation(session_id).map(Some),
        };

        if let Err(e) = &result {
            self.inner
                .logger
                .warn(&format!("[SessionHub {}] Rejected: {}", session_id, e));
            self.notify(session_id, Notification::error(e.to_string()));
        }
        result
    }

    /// Current status of a session
    pub fn status(&self, session_id: &str) -> Option<SessionStatus> {
        self.inner.store.status(session_id)
    }

    pub fn session_count(&self) -> usize {
        self.inner.store.len()
    }

    /// Tear down every session and wait (bounded) for the connections to close
    pub fn close_all(&self) {
        let sessions = self.inner.store.drain();
        let tickets: Vec<Ticket<()>> = sessions
            .into_iter()
            .filter_map(|(id, session)| self.schedule_close(id, session).ok())
            .collect();
        for ticket in tickets {
            if let Err(e) = ticket.wait_timeout(self.inner.close_timeout) {
                self.inner
                    .logger
                    .warn(&format!("[SessionHub] Session teardown: {}", e));
            }
        }
    }

    fn notify(&self, session_id: &str, notification: Notification) {
        self.inner.notifier.notify(session_id, notification);
    }

    fn connect(&self, session_id: &str) -> Dispatch {
        if self.inner.store.open(session_id) {
            self.inner
                .logger
                .info(&format!("[SessionHub {}] Client connected", session_id));
        }
        self.notify(
            session_id,
            Notification::status("Connected to the server. Ready to initialize MCP clients."),
        );
        None
    }

    fn disconnect(&self, session_id: &str) -> HubResult<Dispatch> {
        self.inner
            .logger
            .info(&format!("[SessionHub {}] Client disconnected", session_id));
        match self.inner.store.remove(session_id) {
            Some(session) => Ok(Some(self.schedule_close(session_id.to_string(), session)?)),
            None => Ok(None),
        }
    }

    fn schedule_close(&self, session_id: String, session: SessionHandle) -> Result<Ticket<()>, BridgeError> {
        let logger = Arc::clone(&self.inner.logger);
        self.inner.bridge.schedule(async move {
            session.lock().await.close().await;
            logger.info(&format!("[SessionHub {}] Cleanup complete", session_id));
        })
    }

    fn server_list(&self, session_id: &str) -> HubResult<()> {
        let servers = self.inner.config.backends()?;
        self.notify(session_id, Notification::AvailableServers { servers });
        Ok(())
    }

    fn select_backends(&self, selected_ids: &[String]) -> HubResult<Vec<BackendDescriptor>> {
        if selected_ids.is_empty() {
            return Err(HubError::NoServersSelected);
        }
        let configured = self.inner.config.backends()?;
        if configured.is_empty() {
            return Err(HubError::NoServersConfigured);
        }
        let selected: Vec<BackendDescriptor> = configured
            .into_iter()
            .filter(|b| selected_ids.contains(&b.id))
            .collect();
        if selected.is_empty() {
            return Err(HubError::InvalidSelection(selected_ids.to_vec()));
        }
        Ok(selected)
    }

    fn initialize(&self, session_id: &str, selected_ids: &[String]) -> HubResult<Ticket<()>> {
        let inner = &self.inner;
        if !inner.store.contains(session_id) {
            return Err(HubError::UnknownSession(session_id.to_string()));
        }
        let backends = self.select_backends(selected_ids)?;
        if inner.provider.requires_api_key() && inner.model.api_key.is_none() {
            return Err(HubError::MissingApiKey {
                provider: inner.provider.name().to_string(),
            });
        }

        let session = inner.store.begin_initialize(session_id, || {
            let tool_loop = ToolLoop::new(
                Arc::clone(&inner.provider),
                inner.model.clone(),
                inner.loop_options.clone(),
                Arc::clone(&inner.logger),
            );
            Session::new(session_id, tool_loop, Arc::clone(&inner.logger))
                .with_close_timeout(inner.close_timeout)
        })?;

        self.notify(
            session_id,
            Notification::status(format!(
                "Initializing MCP client... connecting to {} selected server(s).",
                backends.len()
            )),
        );

        let hub = self.clone();
        let id = session_id.to_string();
        let scheduled = inner.bridge.schedule(async move {
            let connector = Arc::clone(&hub.inner.connector);
            let work_session = Arc::clone(&session);
            let outcome = guarded(async move {
                let mut session = work_session.lock().await;
                session.initialize(connector.as_ref(), backends).await
            })
            .await;

            // Disconnected meanwhile: nobody will close this session later
            if !hub.inner.store.is_current(&id, &session) {
                session.lock().await.close().await;
                return;
            }

            match outcome {
                Ok(report) if report.any_connected() => {
                    hub.inner.store.set_status(&id, SessionStatus::Connected);
                    hub.notify(
                        &id,
                        Notification::McpInitialized {
                            message: format!(
                                "Chatbot initialized with {} server(s) and {} tools available.",
                                report.connected_servers, report.total_tools
                            ),
                            tools_available: report.tools_available(),
                            connected_servers: report.connected_servers,
                            total_tools: report.total_tools,
                        },
                    );
                }
                Ok(_) => {
                    hub.inner
                        .store
                        .set_status(&id, SessionStatus::FailedConnection);
                    hub.notify(&id, Notification::error("Could not connect to the MCP servers."));
                }
                Err(e) => {
                    hub.inner.store.set_status(&id, SessionStatus::Failed);
                    hub.notify(
                        &id,
                        Notification::error(format!(
                            "Error while connecting to the MCP servers: {}",
                            e
                        )),
                    );
                }
            }
        });

        scheduled.map_err(|e| {
            inner.store.set_status(session_id, SessionStatus::Failed);
            HubError::from(e)
        })
    }

    fn send_message(&self, session_id: &str, message: String) -> HubResult<Ticket<()>> {
        let text = message.trim().to_string();
        if text.is_empty() {
            return Err(HubError::EmptyMessage);
        }
        let session = self.inner.store.begin_turn(session_id)?;
        self.notify(session_id, Notification::status("Processing query..."));

        let hub = self.clone();
        let id = session_id.to_string();
        let handle = Arc::clone(&session);
        let scheduled = self.inner.bridge.schedule(async move {
            let work_session = Arc::clone(&session);
            let outcome =
                guarded(async move { work_session.lock().await.send_message(&text).await }).await;

            // Disconnected meanwhile: the id may already belong to a new session
            if !hub.inner.store.is_current(&id, &session) {
                hub.inner
                    .logger
                    .info(&format!("[SessionHub {}] Dropping reply for a closed session", id));
                return;
            }

            match outcome {
                Ok(Ok(reply)) => hub.notify(
                    &id,
                    Notification::NewMessage {
                        sender: "bot".to_string(),
                        text: reply,
                    },
                ),
                Ok(Err(e)) => hub.notify(
                    &id,
                    Notification::error(format!("Error while processing the query: {}", e)),
                ),
                Err(e) => hub.notify(
                    &id,
                    Notification::error(format!("Error while processing the query: {}", e)),
                ),
            }
            hub.inner.store.end_turn(&id, &session);
            hub.notify(&id, Notification::status("Ready for the next query."));
        });

        scheduled.map_err(|e| {
            self.inner.store.end_turn(session_id, &handle);
            HubError::from(e)
        })
    }

    fn reset_conversation(&self, session_id: &str) -> HubResult<Ticket<()>> {
        let session = self.inner.store.begin_turn(session_id)?;
        self.notify(session_id, Notification::status("Resetting conversation..."));

        let hub = self.clone();
        let id = session_id.to_string();
        let handle = Arc::clone(&session);
        let scheduled = self.inner.bridge.schedule(async move {
            session.lock().await.reset_conversation();
            if !hub.inner.store.is_current(&id, &session) {
                return;
            }
            hub.notify(&id, Notification::ConversationReset);
            hub.inner.store.end_turn(&id, &session);
            hub.notify(&id, Notification::status("Conversation reset. Ready."));
        });

        scheduled.map_err(|e| {
            self.inner.store.end_turn(session_id, &handle);
            HubError::from(e)
        })
    }
}

/// Run `work` as its own task so a panic is reported instead of lost
async fn guarded<F, T>(work: F) -> Result<T, String>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work).await.map_err(|e| e.to_string())
}
