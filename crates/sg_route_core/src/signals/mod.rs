pub mod timestamp;
pub mod traffic;

pub use traffic::{SignalKind, TrafficSignalExtractor};
