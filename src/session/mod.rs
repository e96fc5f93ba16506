// Live session: connection, decoder and store wired into one ordered loop

use crate::config::FirewatchConfig;
use crate::connection::{ConnectionEvent, ConnectionManager, StreamConnector};
use crate::message::{decode_frame, Decoded, OutboundCommand};
use crate::state::{LiveSnapshot, LiveStore, StoreChange};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Everything the store consumer reacts to, in arrival order
#[derive(Debug)]
enum SessionInput {
    Connection(ConnectionEvent),
    Acknowledge(String),
    Stop,
}

impl From<ConnectionEvent> for SessionInput {
    fn from(event: ConnectionEvent) -> Self {
        SessionInput::Connection(event)
    }
}

/// Running live-tracking session.
///
/// Owns the stream connection and the task that owns the [`LiveStore`].
/// Readers get immutable snapshots and a change feed; they never touch the
/// store directly.
pub struct LiveSession {
    inputs: mpsc::UnboundedSender<SessionInput>,
    snapshots: watch::Receiver<Arc<LiveSnapshot>>,
    changes: broadcast::Sender<StoreChange>,
    connection: ConnectionManager<SessionInput>,
    consumer: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Create the store, spawn its consumer and open the stream connection.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &FirewatchConfig, connector: Arc<dyn StreamConnector>) -> Self {
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let (changes_tx, _) = broadcast::channel(1000);

        let store = LiveStore::new(&config.store);
        let (snapshots_tx, snapshots_rx) = watch::channel(Arc::new(store.snapshot()));

        let mut connection = ConnectionManager::new(config.stream.clone(), connector, inputs_tx.clone());
        connection.connect();

        let consumer = StoreConsumer {
            store,
            inputs: inputs_rx,
            commands: connection.command_sender(),
            snapshots: snapshots_tx,
            changes: changes_tx.clone(),
        };

        info!(url = %config.stream.url, "Live session started");

        Self {
            inputs: inputs_tx,
            snapshots: snapshots_rx,
            changes: changes_tx,
            connection,
            consumer: Some(tokio::spawn(consumer.run())),
        }
    }

    /// Latest published state
    pub fn snapshot(&self) -> Arc<LiveSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Snapshot receiver for callers that want to await the next update
    pub fn watch(&self) -> watch::Receiver<Arc<LiveSnapshot>> {
        self.snapshots.clone()
    }

    /// Subscribe to store changes
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Acknowledge an alert. Applied locally right away and sent to the
    /// server if connected; the server's confirmation is not awaited.
    pub fn acknowledge_alert(&self, alert_id: impl Into<String>) {
        let alert_id = alert_id.into();
        if self.inputs.send(SessionInput::Acknowledge(alert_id.clone())).is_err() {
            warn!(alert_id = %alert_id, "Session stopped, acknowledge ignored");
        }
    }

    /// Close the connection, cancel any pending reconnect and stop the
    /// consumer once it has drained queued inputs.
    pub async fn shutdown(&mut self) {
        self.connection.teardown().await;

        if let Some(consumer) = self.consumer.take() {
            let _ = self.inputs.send(SessionInput::Stop);
            if let Err(e) = consumer.await {
                error!(error = %e, "Store consumer failed");
            }
            info!("Live session stopped");
        }
    }
}

struct StoreConsumer {
    store: LiveStore,
    inputs: mpsc::UnboundedReceiver<SessionInput>,
    commands: mpsc::UnboundedSender<OutboundCommand>,
    snapshots: watch::Sender<Arc<LiveSnapshot>>,
    changes: broadcast::Sender<StoreChange>,
}

impl StoreConsumer {
    async fn run(mut self) {
        while let Some(input) = self.inputs.recv().await {
            let changes = match input {
                SessionInput::Connection(event) => self.handle_connection(event),
                SessionInput::Acknowledge(alert_id) => self.handle_acknowledge(alert_id),
                SessionInput::Stop => break,
            };

            if !changes.is_empty() {
                self.publish(changes);
            }
        }
        debug!("Store consumer stopped");
    }

    fn handle_connection(&mut self, event: ConnectionEvent) -> Vec<StoreChange> {
        match event {
            ConnectionEvent::Opened => self.store.set_connected(true).into_iter().collect(),
            ConnectionEvent::Closed => self.store.set_connected(false).into_iter().collect(),
            ConnectionEvent::Frame(text) => match decode_frame(&text) {
                Ok(Decoded::Message(message)) => self.store.apply(message, Utc::now()),
                Ok(Decoded::Unknown(kind)) => {
                    debug!(kind = ?kind, "Ignoring unknown message type");
                    Vec::new()
                }
                Err(e) => {
                    warn!(error = %e, "Dropping malformed frame");
                    Vec::new()
                }
            },
        }
    }

    fn handle_acknowledge(&mut self, alert_id: String) -> Vec<StoreChange> {
        if !self.store.acknowledge(&alert_id) {
            debug!(alert_id = %alert_id, "Acknowledge for unknown alert ignored");
            return Vec::new();
        }

        info!(alert_id = %alert_id, "Alert acknowledged");
        if !self.store.is_connected() {
            warn!(alert_id = %alert_id, "Not connected, acknowledge kept local only");
        } else if self
            .commands
            .send(OutboundCommand::acknowledge(alert_id.clone()))
            .is_err()
        {
            warn!(alert_id = %alert_id, "Connection stopped, acknowledge kept local only");
        }

        vec![StoreChange::AlertAcknowledged { alert_id }]
    }

    fn publish(&self, changes: Vec<StoreChange>) {
        self.snapshots.send_replace(Arc::new(self.store.snapshot()));
        for change in changes {
            // No receivers is fine
            let _ = self.changes.send(change);
        }
    }
}
