pub mod checker;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod shape;

pub use checker::{CheckReport, check_document};
pub use config::{CheckConfig, ShapeConfig};
pub use error::{ConfigError, Failure};
pub use interpreter::Interpreter;
