pub mod core;
pub mod import;
pub mod migrate;
pub mod paths;
pub mod status;
pub mod store;

pub use self::core::*;
pub use store::SqliteStore;
