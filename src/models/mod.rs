pub mod tracker;

pub use tracker::{TrackerStats, WatchStatus};
