//! Corax provider core library.
//!
//! Holds the pieces of the provider that do not talk to the network:
//!
//! - [`DynamicValue`]: the closed value type used for free-form attributes
//!   such as `custom_parameters` and `schema_def`
//! - [`schema_def::normalize`]: canonical JSON rendering of structured-output
//!   schemas, so repeated applies produce byte-identical state

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod schema_def;
pub mod value;

pub use error::{Error, Result};
pub use value::DynamicValue;
