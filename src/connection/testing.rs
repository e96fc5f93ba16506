//! In-memory stream connector for tests.

use super::transport::{FrameStream, StreamConnector};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Server side of one fake connection
pub struct FakePeer {
    /// Push frames to the client. Dropping it closes the connection.
    pub inbound: mpsc::UnboundedSender<String>,
    /// Frames the client sent
    pub outbound: mpsc::UnboundedReceiver<String>,
}

pub struct FakeConnector {
    attempts: AtomicUsize,
    refuse: AtomicBool,
    peers: mpsc::UnboundedSender<FakePeer>,
}

impl FakeConnector {
    /// Returns the connector and a receiver yielding one peer per accepted connection
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<FakePeer>) {
        let (peers, peers_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            attempts: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
            peers,
        });
        (connector, peers_rx)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Make subsequent connection attempts fail
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl StreamConnector for FakeConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn FrameStream>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let _ = self.peers.send(FakePeer {
            inbound: inbound_tx,
            outbound: outbound_rx,
        });

        Ok(Box::new(FakeStream {
            inbound: inbound_rx,
            outbound: outbound_tx,
        }))
    }
}

struct FakeStream {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl FrameStream for FakeStream {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn send_frame(&mut self, frame: String) -> Result<()> {
        self.outbound
            .send(frame)
            .map_err(|_| anyhow!("peer gone"))
    }

    async fn close(&mut self) -> Result<()> {
        self.inbound.close();
        Ok(())
    }
}
