//! Wire payload types exchanged with the metadata server.
//!
//! The metadata server's response shape is not fixed across deployments,
//! so every server-side record here is an all-optional struct that
//! deserializes leniently and never fails on unexpected field types.

pub mod envelope;
pub mod lenient;
pub mod types;

pub use envelope::{ServerEnvelope, ServerFileRecord};
pub use types::{FileDescriptor, MetadataRequest, PartialFileDescriptor};
