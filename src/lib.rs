//! ctwrap turns a declaration model of a C-style native library into a
//! Python module that calls the library through `ctypes`.

pub mod cli;
pub mod codegen;
pub mod config;
pub mod utils;

pub use codegen::{CodegenError, WrapperGenerator};
pub use config::{ConfigOverrides, GeneratorConfig};
