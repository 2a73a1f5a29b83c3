//! Declaration model consumed by the ctwrap generator.
//!
//! The model is produced once by an external header parser (or written by
//! hand) and is read-only afterwards: enumerations, native function
//! signatures, and the name of the enumeration that carries status codes.

pub mod decl;
pub mod loader;
pub mod validate;

pub use decl::{ArgumentDecl, DeclarationModel, EnumDecl, FunctionDecl};
pub use loader::{LoadError, ModelFormat, load_model, parse_model};
pub use validate::ModelError;
