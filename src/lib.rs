/// The JSON value model: a closed set of six variants with
/// order-preserving containers and compact serialization
pub mod value;

/// Convenience functions and utilities
mod utils;


/// The recursive-descent parser
pub mod parser;

/// The deserialization module, for `serde` compatibility (optional feature)
#[cfg(feature = "serde")]
pub mod de;

/// The serialization module, for `serde` compatibility (optional feature)
#[cfg(feature = "serde")]
pub mod ser;

/// The `serde` deserializer
#[cfg(feature = "serde")]
pub use de::{from_str, from_value, ValueDeserializer};

/// the `serde` serializer
#[cfg(feature = "serde")]
pub use ser::{to_string, to_value, ValueSerializer};

/// the value model types
pub use value::{Array, Object, Value};

/// turn your strings into the JSON value model
pub use parser::from_str as model_from_str;

/// turn raw bytes into the JSON value model
pub use parser::from_bytes as model_from_bytes;

/// read a whole file into memory and parse it
pub use parser::from_file as model_from_file;

/// parser error types
pub use parser::{LoadError, ParsingError};
