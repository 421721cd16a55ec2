/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod config;
pub mod console;
pub mod filesystem;
pub mod locking;
pub mod network;
pub mod storage;
pub mod updaters;
