use std::sync::{Arc, Mutex};

use rogs_common::RealtimeError;
use tracing::{debug, info};

use super::handle::Connection;
use super::transport::Connector;
use super::types::{ConnectionState, RealtimeConfig};
use crate::events::EventBus;
use crate::sync::lock;

/// Owns the single client connection.
///
/// `connect` is idempotent: while a live connection exists it is returned
/// as is and the supplied token is ignored. Use [`reconnect`](Self::reconnect)
/// to switch tokens.
pub struct ConnectionManager {
    config: RealtimeConfig,
    connector: Arc<dyn Connector>,
    events: EventBus,
    current: Mutex<Option<Connection>>,
}

impl ConnectionManager {
    pub fn new(config: RealtimeConfig, connector: Arc<dyn Connector>, events: EventBus) -> Self {
        Self {
            config,
            connector,
            events,
            current: Mutex::new(None),
        }
    }

    /// The live connection, opening one with `auth_token` if there is none.
    pub fn connect(&self, auth_token: &str) -> Connection {
        let mut current = lock(&self.current);
        if let Some(connection) = current.as_ref().filter(|c| c.is_live()) {
            if connection.auth_token() != auth_token {
                debug!(session = %connection.session_id(), "Connection already open; ignoring new auth token");
            }
            return connection.clone();
        }
        let connection = self.open(auth_token);
        *current = Some(connection.clone());
        connection
    }

    /// Close the current connection, if any, and open a new one.
    pub fn reconnect(&self, auth_token: &str) -> Connection {
        let mut current = lock(&self.current);
        if let Some(old) = current.take() {
            info!(session = %old.session_id(), "Replacing realtime connection");
            old.shutdown();
        }
        let connection = self.open(auth_token);
        *current = Some(connection.clone());
        connection
    }

    /// The live connection, or [`RealtimeError::NotInitialized`].
    pub fn current(&self) -> Result<Connection, RealtimeError> {
        lock(&self.current)
            .as_ref()
            .filter(|c| c.is_live())
            .cloned()
            .ok_or(RealtimeError::NotInitialized)
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.current)
            .as_ref()
            .map(Connection::state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Leave every channel, close the socket, and wait for the loop to exit.
    pub async fn disconnect(&self) {
        let connection = lock(&self.current).take();
        if let Some(connection) = connection {
            info!(session = %connection.session_id(), "Disconnecting realtime connection");
            connection.shutdown();
            connection.closed().await;
        }
    }

    fn open(&self, auth_token: &str) -> Connection {
        Connection::open(
            self.config.clone(),
            auth_token,
            Arc::clone(&self.connector),
            self.events.clone(),
        )
    }
}
