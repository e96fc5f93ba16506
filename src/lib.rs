// Wire messages and decoding
pub mod message;

// Live state store and local alert derivation
pub mod state;

// Stream connection and reconnect
pub mod connection;

// Live session wiring connection, decoder and store
pub mod session;

// Historical queries and track playback
pub mod history;

// Persisted display preferences
pub mod preferences;

// Configuration
pub mod config;
