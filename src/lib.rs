//! Web form → datagram → JSON store message pipeline.

pub mod common;
pub mod config;
pub mod error;
pub mod network;
pub mod storage;
pub mod supervisor;
pub mod web;

pub use common::{Message, Record};
pub use supervisor::Supervisor;
