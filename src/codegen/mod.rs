//! Python `ctypes` wrapper generation.
//!
//! Each construct of the emitted module has its own emitter; the
//! [`WrapperGenerator`] stitches them together in a fixed order.

pub mod assembler;
pub mod builder;
pub mod call;
pub mod classify;
pub mod error;
pub mod marshal;
pub mod method;
pub mod result;
pub mod signature;
pub mod support;

pub use assembler::WrapperGenerator;
pub use builder::{CodeBuilder, Emit};
pub use classify::{ArgRole, ClassifiedArg, NativeScalar, classify_function};
pub use error::{CodegenError, Direction};
pub use method::{MethodBlock, MethodPlan};
pub use signature::{MethodNaming, MethodSignature, build_signature};
pub use support::PythonVersion;
