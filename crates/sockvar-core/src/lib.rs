//! Core types shared by the sockvar crates: parsed variables, the binding
//! seam, and tracing setup.

pub mod tracing;
pub mod variables;

pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use variables::{
    DEFAULT_COUNT_VARIABLE, VariableBindings, VariableEntry, VariableSink, bind_entries,
};
