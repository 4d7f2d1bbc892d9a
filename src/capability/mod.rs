//! Capability support shared by the chat and completion resources
//!
//! Both capability kinds carry the same behavioural `config` block; this
//! module owns its model and the mapping to and from the wire.

pub mod config;

pub use config::{
    BlobConfigModel, CapabilityConfigModel, DataRetentionModel, RETENTION_INFINITE,
    RETENTION_TIMED, custom_parameters_to_wire, from_wire, to_wire, validate,
};
