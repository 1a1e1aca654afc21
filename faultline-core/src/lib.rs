//! Faultline core library: fault-graph projection, hierarchical partitioning,
//! and community analytics.
//!
//! The main entry point is [`pipeline::FaultlinePipeline`], which runs
//! Project → Partition → (Bridges, Fingerprints, Hubs) → Context over a
//! [`snapshot::GraphSnapshot`]. Every stage is also usable on its own through
//! [`analyze`]; [`artifact`] reads and writes the persisted interchange files.

pub mod analyze;
pub mod artifact;
pub mod config;
pub mod contracts;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod snapshot;
pub mod types;
