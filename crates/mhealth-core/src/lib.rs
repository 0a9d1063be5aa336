pub mod calibrator;
pub mod clipper;
pub mod config;
pub mod discovery;
pub mod error;
pub mod metadata;
pub mod outputs;
pub mod pipeline;
pub mod processor;
pub mod reference;
pub mod timestamp_syncer;
pub mod transforms;

#[cfg(feature = "runtime")]
pub mod batch;
