//! Errors raised by the value model.

use thiserror::Error;

use crate::types::DataType;

/// Failure to build a typed value from outside input.
#[derive(Debug, Error)]
pub enum ValueError {
    /// A literal does not parse as the requested type.
    #[error("cannot parse `{input}` as {data_type}")]
    Parse { input: String, data_type: DataType },
}
