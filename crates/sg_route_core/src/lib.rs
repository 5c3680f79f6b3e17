pub mod config;
pub mod db;
pub mod directions;
pub mod error;
pub mod evaluate;
pub mod geocode;
pub mod model;
pub mod normalize;
pub mod parking;
pub mod retry;
pub mod scoring;
pub mod signals;
pub mod store;

pub use error::{EngineError, EngineResult};
