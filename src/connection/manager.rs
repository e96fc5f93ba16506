use crate::connection::transport::{FrameStream, StreamConnector};
use crate::message::OutboundCommand;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Stream endpoint configuration
#[derive(Clone, Debug, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_url")]
    pub url: String,
    /// Fixed delay before each reconnect attempt (milliseconds)
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_stream_url() -> String {
    "ws://localhost:8080/ws".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Observable connection events, delivered in order
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionEvent {
    Opened,
    Closed,
    Frame(String),
}

/// Owns the single persistent stream connection.
///
/// Reconnects after a fixed delay every time the connection drops, for as
/// long as the manager is alive. Events are forwarded to `events` as `E`,
/// which lets the owner merge them into its own ordered input queue.
pub struct ConnectionManager<E> {
    config: StreamConfig,
    connector: Arc<dyn StreamConnector>,
    events: mpsc::UnboundedSender<E>,
    commands_tx: mpsc::UnboundedSender<OutboundCommand>,
    commands_rx: Option<mpsc::UnboundedReceiver<OutboundCommand>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<mpsc::UnboundedReceiver<OutboundCommand>>>,
}

impl<E> ConnectionManager<E>
where
    E: From<ConnectionEvent> + Send + 'static,
{
    pub fn new(
        config: StreamConfig,
        connector: Arc<dyn StreamConnector>,
        events: mpsc::UnboundedSender<E>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            config,
            connector,
            events,
            commands_tx,
            commands_rx: Some(commands_rx),
            shutdown_tx: None,
            task: None,
        }
    }

    /// Start the connection task. No-op while it is already running.
    pub fn connect(&mut self) {
        if self.is_running() {
            debug!("Connection already active, ignoring connect");
            return;
        }

        let commands = match self.commands_rx.take() {
            Some(rx) => rx,
            None => {
                // Previous task did not hand its receiver back
                let (tx, rx) = mpsc::unbounded_channel();
                self.commands_tx = tx;
                rx
            }
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = ConnectionWorker {
            url: self.config.url.clone(),
            reconnect_delay: self.config.reconnect_delay(),
            connector: Arc::clone(&self.connector),
            events: self.events.clone(),
            commands,
            shutdown: shutdown_rx,
        };

        info!(url = %self.config.url, "Starting stream connection");
        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(tokio::spawn(worker.run()));
    }

    /// Cancel any pending reconnect and close the active connection.
    ///
    /// Safe to call when never connected, and more than once.
    pub async fn teardown(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(commands) => self.commands_rx = Some(commands),
                Err(e) => error!(error = %e, "Connection task failed"),
            }
            info!("Stream connection torn down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Handle for queueing outbound commands.
    ///
    /// Commands are sent on the open connection; any queued while
    /// disconnected are dropped.
    pub fn command_sender(&self) -> mpsc::UnboundedSender<OutboundCommand> {
        self.commands_tx.clone()
    }
}

enum Step {
    Shutdown,
    Frame(Option<anyhow::Result<String>>),
    Command(OutboundCommand),
}

struct ConnectionWorker<E> {
    url: String,
    reconnect_delay: Duration,
    connector: Arc<dyn StreamConnector>,
    events: mpsc::UnboundedSender<E>,
    commands: mpsc::UnboundedReceiver<OutboundCommand>,
    shutdown: watch::Receiver<bool>,
}

impl<E> ConnectionWorker<E>
where
    E: From<ConnectionEvent> + Send + 'static,
{
    async fn run(mut self) -> mpsc::UnboundedReceiver<OutboundCommand> {
        loop {
            let connected = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                result = self.connector.connect(&self.url) => result,
            };

            match connected {
                Ok(mut stream) => {
                    info!(url = %self.url, "Stream connected");
                    self.drop_queued_commands();
                    self.emit(ConnectionEvent::Opened);

                    let shutdown = self.pump(stream.as_mut()).await;

                    if let Err(e) = stream.close().await {
                        debug!(error = %e, "Error closing stream");
                    }
                    self.emit(ConnectionEvent::Closed);

                    if shutdown {
                        break;
                    }
                    warn!(url = %self.url, "Stream disconnected");
                }
                Err(e) => {
                    warn!(error = %e, url = %self.url, "Stream connection failed");
                    self.emit(ConnectionEvent::Closed);
                }
            }

            if !self.wait_before_reconnect().await {
                break;
            }
        }

        debug!("Connection worker stopped");
        self.commands
    }

    /// Forward frames and commands until the connection ends.
    /// Returns true when stopped by shutdown.
    async fn pump(&mut self, stream: &mut dyn FrameStream) -> bool {
        loop {
            let step = tokio::select! {
                biased;
                _ = self.shutdown.changed() => Step::Shutdown,
                Some(command) = self.commands.recv() => Step::Command(command),
                frame = stream.next_frame() => Step::Frame(frame),
            };

            match step {
                Step::Shutdown => return true,
                Step::Frame(Some(Ok(text))) => self.emit(ConnectionEvent::Frame(text)),
                Step::Frame(Some(Err(e))) => {
                    warn!(error = %e, "Stream read error");
                    return false;
                }
                Step::Frame(None) => return false,
                Step::Command(command) => match command.to_frame() {
                    Ok(frame) => {
                        if let Err(e) = stream.send_frame(frame).await {
                            warn!(error = %e, "Failed to send command");
                            return false;
                        }
                        debug!(command = ?command, "Command sent");
                    }
                    Err(e) => error!(error = %e, "Failed to encode command"),
                },
            }
        }
    }

    /// Sleep for the reconnect delay. Returns false if shut down meanwhile.
    async fn wait_before_reconnect(&mut self) -> bool {
        info!(
            delay_ms = self.reconnect_delay.as_millis() as u64,
            "Scheduling reconnect"
        );
        let delay = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => return false,
                _ = &mut delay => return true,
                Some(command) = self.commands.recv() => {
                    warn!(command = ?command, "Not connected, dropping command");
                }
            }
        }
    }

    fn drop_queued_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            warn!(command = ?command, "Command queued while disconnected, dropping");
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        let _ = self.events.send(E::from(event));
    }
}
