use std::fmt;

use thiserror::Error;

/// Whether the native function reads or writes through an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.pad("input"),
            Direction::Output => f.pad("output"),
        }
    }
}

/// Generation-time failures. Any of these aborts generation of the whole
/// wrapper; nothing is emitted for a model that produces one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error(
        "cannot create python to c conversion for {direction} argument `{argument}` in `{function}`"
    )]
    Conversion {
        direction: Direction,
        argument: String,
        function: String,
    },
    #[error("unsupported native type `{type_name}` for argument `{argument}` in `{function}`")]
    UnsupportedType {
        type_name: String,
        argument: String,
        function: String,
    },
    #[error("`{function}` does not return a status code but declares no return value")]
    MissingReturnValue { function: String },
    #[error("output array `{argument}` in `{function}` declares no size arguments")]
    UnsizedArray { argument: String, function: String },
    #[error(
        "array `{argument}` in `{function}` cannot take its length from argument {index}"
    )]
    InvalidSizeArgument {
        argument: String,
        function: String,
        index: usize,
    },
    #[error("the method generated for `{function}` would bind `{name}` twice")]
    NameCollision { name: String, function: String },
}
