pub mod types;

pub use types::{DEFAULT_USERNAME, Message, Record};
