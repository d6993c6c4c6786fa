pub mod analysis;
pub mod bench;
pub mod config;
pub mod consts;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod report;
pub mod scoring;
pub mod search;
pub mod seeds;
pub mod sequence;
pub mod session;
pub mod transform;
pub mod tuner;
pub mod weights;
// cmd and reports belong to the binary (main.rs).
