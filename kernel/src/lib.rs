//! Training-side progress publishing: what runs inside the compute session.

pub mod publisher;

pub use publisher::ProgressPublisher;
