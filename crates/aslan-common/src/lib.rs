pub mod error;
pub mod span;
pub mod value;

pub use error::ConfigError;
pub use span::Span;
pub use value::{Map, Value};
