//! Readings filter for a data pipeline.
//!
//! Readings whose asset code is on the configured allow-list get a fixed
//! offset added to every datapoint, optionally clamped to a maximum. All
//! other readings pass through untouched.
//!
//! The host owns a [`FilterStore`], feeds it configuration envelopes via
//! [`FilterStore::update`] and batches via [`FilterStore::transform`].

pub mod data;
pub mod error;
pub mod state;

pub use data::filter::{BoundValue, FilterConfig, OFFSET};
pub use data::model::{DatapointValue, Reading, ReadingBatch};
pub use error::FilterError;
pub use state::{ConfigEnvelope, FilterStore};
