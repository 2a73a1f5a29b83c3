use std::fmt;

use ctwrap_model::{ArgumentDecl, FunctionDecl};

use super::error::{CodegenError, Direction};

/// The native scalar types the wrapper knows how to marshal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeScalar {
    Int,
    Double,
    Float,
    Char,
    Bool,
}

impl NativeScalar {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "double" => Some(Self::Double),
            "float" => Some(Self::Float),
            "char" => Some(Self::Char),
            "bool" => Some(Self::Bool),
            _ => None,
        }
    }

    /// The `ctypes` type constructor, e.g. `ctypes.c_double`.
    pub fn ctype(self) -> &'static str {
        match self {
            Self::Int => "ctypes.c_int",
            Self::Double => "ctypes.c_double",
            Self::Float => "ctypes.c_float",
            Self::Char => "ctypes.c_char",
            Self::Bool => "ctypes.c_bool",
        }
    }
}

impl fmt::Display for NativeScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::Float => "float",
            Self::Char => "char",
            Self::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// How an argument crosses the native boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRole {
    /// The session handle, threaded from wrapper state.
    Handle,
    Scalar(NativeScalar),
    Text,
    Array(NativeScalar),
}

impl fmt::Display for ArgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgRole::Handle => f.write_str("handle"),
            ArgRole::Scalar(scalar) => write!(f, "scalar<{scalar}>"),
            ArgRole::Text => f.write_str("text"),
            ArgRole::Array(scalar) => write!(f, "array<{scalar}>"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifiedArg<'a> {
    pub index: usize,
    pub decl: &'a ArgumentDecl,
    pub direction: Direction,
    pub role: ArgRole,
}

impl ClassifiedArg<'_> {
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn is_handle(&self) -> bool {
        self.role == ArgRole::Handle
    }

    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }
}

/// Classifies every argument of `function` in declaration order.
pub fn classify_function(function: &FunctionDecl) -> Result<Vec<ClassifiedArg<'_>>, CodegenError> {
    let handle_index = function.handle_index();
    function
        .arguments
        .iter()
        .enumerate()
        .map(|(index, decl)| {
            let direction = if decl.is_outarg {
                Direction::Output
            } else {
                Direction::Input
            };
            let role = if Some(index) == handle_index {
                ArgRole::Handle
            } else {
                classify_argument(&function.name, decl, direction)?
            };
            Ok(ClassifiedArg {
                index,
                decl,
                direction,
                role,
            })
        })
        .collect()
}

/// Applies the marshaling rules for one non-handle argument.
///
/// Inputs: text, by-value scalars and pointer arrays. Outputs: pointer
/// arrays, text, and single-pointer scalars. Every other shape is rejected.
pub fn classify_argument(
    function: &str,
    decl: &ArgumentDecl,
    direction: Direction,
) -> Result<ArgRole, CodegenError> {
    let scalar = native_scalar(function, decl)?;
    let role = match direction {
        Direction::Input => {
            if decl.is_string {
                Some(ArgRole::Text)
            } else if !decl.is_array && decl.npointer == 0 {
                Some(ArgRole::Scalar(scalar))
            } else if decl.is_array && decl.npointer > 0 {
                Some(ArgRole::Array(scalar))
            } else {
                None
            }
        }
        Direction::Output => {
            if decl.is_array && decl.npointer > 0 {
                Some(ArgRole::Array(scalar))
            } else if decl.is_string {
                Some(ArgRole::Text)
            } else if !decl.is_array && decl.npointer == 1 {
                Some(ArgRole::Scalar(scalar))
            } else {
                None
            }
        }
    };

    role.ok_or_else(|| CodegenError::Conversion {
        direction,
        argument: decl.name.clone(),
        function: function.to_string(),
    })
}

/// How an explicit native return value crosses the boundary. Returned
/// values are never arrays or handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnRole {
    Scalar(NativeScalar),
    Text,
}

impl ReturnRole {
    /// The `restype` the native symbol is declared with before the call.
    pub fn restype(self) -> &'static str {
        match self {
            Self::Scalar(scalar) => scalar.ctype(),
            Self::Text => "ctypes.c_char_p",
        }
    }
}

impl From<ReturnRole> for ArgRole {
    fn from(role: ReturnRole) -> Self {
        match role {
            ReturnRole::Scalar(scalar) => ArgRole::Scalar(scalar),
            ReturnRole::Text => ArgRole::Text,
        }
    }
}

impl fmt::Display for ReturnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ArgRole::from(*self).fmt(f)
    }
}

/// Classifies an explicit native return value: text or a by-value scalar.
pub fn classify_return_value(
    function: &str,
    decl: &ArgumentDecl,
) -> Result<ReturnRole, CodegenError> {
    let scalar = native_scalar(function, decl)?;
    if decl.is_string {
        Ok(ReturnRole::Text)
    } else if !decl.is_array {
        Ok(ReturnRole::Scalar(scalar))
    } else {
        Err(CodegenError::Conversion {
            direction: Direction::Output,
            argument: decl.name.clone(),
            function: function.to_string(),
        })
    }
}

fn native_scalar(function: &str, decl: &ArgumentDecl) -> Result<NativeScalar, CodegenError> {
    NativeScalar::from_type_name(&decl.type_name).ok_or_else(|| CodegenError::UnsupportedType {
        type_name: decl.type_name.clone(),
        argument: decl.name.clone(),
        function: function.to_string(),
    })
}
