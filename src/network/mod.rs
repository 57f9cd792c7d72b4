pub mod listener;
pub mod producer;

pub use listener::{Listener, ListenerHandle, MAX_DATAGRAM_SIZE, Readiness};
pub use producer::Producer;
