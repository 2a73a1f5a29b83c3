use std::collections::HashSet;

use thiserror::Error;

use crate::decl::{DeclarationModel, EnumDecl, FunctionDecl};

/// A declaration model that breaks one of the structural invariants the
/// generator relies on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("enum `{name}` is declared more than once")]
    DuplicateEnum { name: String },
    #[error("enum `{enum_name}` declares member `{member}` more than once")]
    DuplicateEnumMember { enum_name: String, member: String },
    #[error("status enum `{name}` is not declared")]
    UnknownStatusEnum { name: String },
    #[error("function `{function}` declares more than one handle argument")]
    MultipleHandles { function: String },
    #[error(
        "argument `{argument}` in `{function}` refers to size argument {index}, but the function only has {count} arguments"
    )]
    SizeIndexOutOfRange {
        function: String,
        argument: String,
        index: usize,
        count: usize,
    },
    #[error("array argument `{argument}` in `{function}` lists itself as its own size")]
    SelfSizedArray { function: String, argument: String },
    #[error("size argument `{argument}` in `{function}` cannot be an array")]
    ArraySizeArgument { function: String, argument: String },
    #[error("`{function}` does not return a status code but declares no return value")]
    MissingReturnValue { function: String },
}

impl DeclarationModel {
    /// Checks every invariant and reports the first violation.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for decl in &self.enums {
            if !seen.insert(decl.name.as_str()) {
                return Err(ModelError::DuplicateEnum {
                    name: decl.name.clone(),
                });
            }
            validate_enum(decl)?;
        }

        if let Some(name) = &self.status_enum {
            if self.find_enum(name).is_none() {
                return Err(ModelError::UnknownStatusEnum { name: name.clone() });
            }
        }

        self.functions.iter().try_for_each(validate_function)
    }
}

impl ModelError {
    /// The enum or function the violation belongs to.
    pub fn subject(&self) -> &str {
        match self {
            ModelError::DuplicateEnum { name } | ModelError::UnknownStatusEnum { name } => name,
            ModelError::DuplicateEnumMember { enum_name, .. } => enum_name,
            ModelError::MultipleHandles { function }
            | ModelError::SizeIndexOutOfRange { function, .. }
            | ModelError::SelfSizedArray { function, .. }
            | ModelError::ArraySizeArgument { function, .. }
            | ModelError::MissingReturnValue { function } => function,
        }
    }

    /// How to repair the declaration, when there is more to say than the
    /// message.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            ModelError::UnknownStatusEnum { .. } => {
                Some("`status_enum` must name one of the declared `enums`")
            }
            ModelError::MultipleHandles { .. } => {
                Some("only one argument of a function may set `handle: true`")
            }
            ModelError::SizeIndexOutOfRange { .. } | ModelError::SelfSizedArray { .. } => {
                Some("`arraysizes` lists the zero-based positions of sibling size arguments")
            }
            ModelError::ArraySizeArgument { .. } => {
                Some("size arguments are scalars; drop either `array` or `sizearg`")
            }
            ModelError::MissingReturnValue { .. } => {
                Some("declare a `return_value` or remove `returns_error: false`")
            }
            ModelError::DuplicateEnum { .. } | ModelError::DuplicateEnumMember { .. } => None,
        }
    }
}

fn validate_enum(decl: &EnumDecl) -> Result<(), ModelError> {
    let mut members = HashSet::new();
    for member in &decl.members {
        if !members.insert(member.as_str()) {
            return Err(ModelError::DuplicateEnumMember {
                enum_name: decl.name.clone(),
                member: member.clone(),
            });
        }
    }
    Ok(())
}

fn validate_function(decl: &FunctionDecl) -> Result<(), ModelError> {
    if decl.arguments.iter().filter(|arg| arg.is_handle).count() > 1 {
        return Err(ModelError::MultipleHandles {
            function: decl.name.clone(),
        });
    }

    if !decl.returns_error && decl.return_value.is_none() {
        return Err(ModelError::MissingReturnValue {
            function: decl.name.clone(),
        });
    }

    let count = decl.arguments.len();
    for (position, arg) in decl.arguments.iter().enumerate() {
        if arg.is_sizearg && arg.is_array {
            return Err(ModelError::ArraySizeArgument {
                function: decl.name.clone(),
                argument: arg.name.clone(),
            });
        }
        for &index in &arg.arraysizes {
            if index >= count {
                return Err(ModelError::SizeIndexOutOfRange {
                    function: decl.name.clone(),
                    argument: arg.name.clone(),
                    index,
                    count,
                });
            }
            if index == position {
                return Err(ModelError::SelfSizedArray {
                    function: decl.name.clone(),
                    argument: arg.name.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::ArgumentDecl;

    fn model_with(function: FunctionDecl) -> DeclarationModel {
        DeclarationModel {
            status_enum: None,
            enums: Vec::new(),
            functions: vec![function],
        }
    }

    #[test]
    fn rejects_duplicate_enum_members() {
        let model = DeclarationModel {
            status_enum: None,
            enums: vec![EnumDecl::new("Mode", ["READ", "WRITE", "READ"])],
            functions: Vec::new(),
        };
        assert_eq!(
            model.validate(),
            Err(ModelError::DuplicateEnumMember {
                enum_name: "Mode".into(),
                member: "READ".into(),
            })
        );
    }

    #[test]
    fn rejects_two_handles() {
        let function = FunctionDecl::new("lib_Merge")
            .arg(ArgumentDecl::new("a", "int").handle())
            .arg(ArgumentDecl::new("b", "int").handle());
        assert!(matches!(
            model_with(function).validate(),
            Err(ModelError::MultipleHandles { .. })
        ));
    }

    #[test]
    fn rejects_size_index_past_the_end() {
        let function = FunctionDecl::new("lib_GetVector")
            .arg(ArgumentDecl::new("values", "double").out().array([3]));
        assert_eq!(
            model_with(function).validate(),
            Err(ModelError::SizeIndexOutOfRange {
                function: "lib_GetVector".into(),
                argument: "values".into(),
                index: 3,
                count: 1,
            })
        );
    }

    #[test]
    fn rejects_array_flagged_as_size() {
        let function = FunctionDecl::new("lib_Odd")
            .arg(ArgumentDecl::new("n", "int").array(Vec::<usize>::new()).sizearg());
        assert!(matches!(
            model_with(function).validate(),
            Err(ModelError::ArraySizeArgument { .. })
        ));
    }

    #[test]
    fn rejects_array_sized_by_itself() {
        let function = FunctionDecl::new("lib_GetVector")
            .arg(ArgumentDecl::new("handle", "int").handle())
            .arg(ArgumentDecl::new("values", "double").pointer(2).out().array([1]));
        assert_eq!(
            model_with(function).validate(),
            Err(ModelError::SelfSizedArray {
                function: "lib_GetVector".into(),
                argument: "values".into(),
            })
        );
    }

    #[test]
    fn rejects_explicit_return_without_value() {
        let mut function = FunctionDecl::new("lib_GetCount");
        function.returns_error = false;

        let err = model_with(function).validate().expect_err("no return value");
        assert_eq!(
            err,
            ModelError::MissingReturnValue {
                function: "lib_GetCount".into(),
            }
        );
        assert_eq!(err.subject(), "lib_GetCount");
    }

    #[test]
    fn rejects_unknown_status_enum() {
        let model = DeclarationModel {
            status_enum: Some("ReturnCode".into()),
            ..DeclarationModel::default()
        };
        assert!(matches!(
            model.validate(),
            Err(ModelError::UnknownStatusEnum { .. })
        ));
    }

    #[test]
    fn accepts_sibling_sized_array() {
        let function = FunctionDecl::new("lib_GetVector")
            .arg(ArgumentDecl::new("handle", "int").handle())
            .arg(ArgumentDecl::new("n", "int").pointer(1).out().sizearg())
            .arg(ArgumentDecl::new("values", "double").pointer(2).out().array([1]));
        assert_eq!(model_with(function).validate(), Ok(()));
    }
}
