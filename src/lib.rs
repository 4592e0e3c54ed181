//! # rocket-telemetry
//!
//! `rocket-telemetry` ingests an at-least-once, possibly out-of-order stream
//! of telemetry messages and reconstructs the state of many independent
//! rockets by applying each channel's messages in sequence-number order.
//!
//! ## Modules
//!
//! - `api`: HTTP intake and read API.
//! - `config`: Configuration management.
//! - `domain`: Rocket aggregate, value objects and domain events.
//! - `pipeline`: Ordered delivery pipeline (sequencer and worker pool).
//! - `storage`: Event log trait, in-memory implementation, rocket store.

pub mod api;
pub mod config;
pub mod domain;
pub mod pipeline;
pub mod storage;
