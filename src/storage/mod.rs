pub mod json_store;

pub use json_store::{DEFAULT_STORE_PATH, JsonStore, RecordMap};
