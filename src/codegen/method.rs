use std::collections::HashSet;

use ctwrap_model::{ArgumentDecl, FunctionDecl};
use tracing::debug;

use super::builder::{CodeBuilder, Emit};
use super::call::{self, STATUS_VAR};
use super::classify::{ArgRole, ClassifiedArg, ReturnRole, classify_function, classify_return_value};
use super::error::{CodegenError, Direction};
use super::marshal::{self, array_type_var, native_var};
use super::result::{ResultAssembly, python_var, size_var};
use super::signature::{MethodNaming, MethodSignature, build_signature};
use super::support::HANDLE_SENTINEL;

/// Names a method body refers to besides its own parameters and locals.
const RESERVED_NAMES: &[&str] = &[
    "self",
    "ctypes",
    "catch_error",
    "_to_native_text",
    "_from_native_text",
    "len",
    "range",
    "False",
    "None",
    "True",
    "and",
    "as",
    "assert",
    "async",
    "await",
    "break",
    "class",
    "continue",
    "def",
    "del",
    "elif",
    "else",
    "except",
    "finally",
    "for",
    "from",
    "global",
    "if",
    "import",
    "in",
    "is",
    "lambda",
    "nonlocal",
    "not",
    "or",
    "pass",
    "raise",
    "return",
    "try",
    "while",
    "with",
    "yield",
];

/// An explicit native return value and its marshaling role.
#[derive(Debug, Clone, Copy)]
pub struct ReturnSlot<'a> {
    pub decl: &'a ArgumentDecl,
    pub role: ReturnRole,
}

/// One factor of an output array's length: a scalar sibling, read from the
/// method parameter for inputs and from its extracted value for outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeTerm<'a> {
    pub name: &'a str,
    pub direction: Direction,
}

/// An output array and the resolved factors of its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArraySizing<'a> {
    pub name: &'a str,
    pub terms: Vec<SizeTerm<'a>>,
}

/// Everything needed to emit one wrapper method, resolved up front so that
/// emission itself cannot fail.
#[derive(Debug, Clone)]
pub struct MethodPlan<'a> {
    pub function: &'a FunctionDecl,
    pub signature: MethodSignature,
    pub args: Vec<ClassifiedArg<'a>>,
    pub return_value: Option<ReturnSlot<'a>>,
    /// Output arrays in declaration order.
    pub arrays: Vec<ArraySizing<'a>>,
}

impl<'a> MethodPlan<'a> {
    pub fn new(function: &'a FunctionDecl, naming: &MethodNaming<'_>) -> Result<Self, CodegenError> {
        let signature = build_signature(function, naming);
        let args = classify_function(function)?;

        let return_value = if function.returns_error {
            None
        } else {
            let decl = function.return_value.as_ref().ok_or_else(|| {
                CodegenError::MissingReturnValue {
                    function: function.name.clone(),
                }
            })?;
            let role = classify_return_value(&function.name, decl)?;
            Some(ReturnSlot { decl, role })
        };

        let arrays = resolve_array_sizes(function, &args)?;
        let plan = Self {
            function,
            signature,
            args,
            return_value,
            arrays,
        };
        plan.check_bound_names()?;
        Ok(plan)
    }

    pub fn symbol(&self) -> &str {
        &self.function.name
    }

    /// Non-handle input arguments in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = &ClassifiedArg<'a>> {
        self.args
            .iter()
            .filter(|arg| !arg.is_output() && !arg.is_handle())
    }

    /// Non-handle output arguments in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = &ClassifiedArg<'a>> {
        self.args
            .iter()
            .filter(|arg| arg.is_output() && !arg.is_handle())
    }

    pub fn threads_handle(&self) -> bool {
        self.args.iter().any(ClassifiedArg::is_handle)
    }

    /// Parameters and generated locals of the emitted method, in the order
    /// they are bound.
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = self.signature.params.clone();
        for arg in self.inputs() {
            if matches!(arg.role, ArgRole::Array(_)) {
                names.push(array_type_var(arg.name()));
            }
            names.push(native_var(arg.name()));
        }
        for arg in self.outputs() {
            names.push(native_var(arg.name()));
        }
        match &self.return_value {
            Some(ret) => {
                names.push(native_var(&ret.decl.name));
                names.push(python_var(&ret.decl.name));
            }
            None => names.push(STATUS_VAR.to_string()),
        }
        for arg in self.outputs() {
            if matches!(arg.role, ArgRole::Array(_)) {
                names.push(size_var(arg.name()));
            }
            names.push(python_var(arg.name()));
        }
        names
    }

    fn check_bound_names(&self) -> Result<(), CodegenError> {
        let mut taken: HashSet<String> = RESERVED_NAMES.iter().map(ToString::to_string).collect();
        for name in self.bound_names() {
            if !taken.insert(name.clone()) {
                return Err(CodegenError::NameCollision {
                    name,
                    function: self.function.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Output arrays need at least one size argument, and every size argument
/// must be a scalar sibling other than the array itself.
fn resolve_array_sizes<'a>(
    function: &FunctionDecl,
    args: &[ClassifiedArg<'a>],
) -> Result<Vec<ArraySizing<'a>>, CodegenError> {
    args.iter()
        .filter(|arg| arg.is_output() && matches!(arg.role, ArgRole::Array(_)))
        .map(|arg| {
            let decl = arg.decl;
            if decl.arraysizes.is_empty() {
                return Err(CodegenError::UnsizedArray {
                    argument: decl.name.clone(),
                    function: function.name.clone(),
                });
            }
            let terms = decl
                .arraysizes
                .iter()
                .map(|&index| {
                    args.get(index)
                        .filter(|sibling| {
                            sibling.index != arg.index
                                && matches!(sibling.role, ArgRole::Scalar(_))
                        })
                        .map(|sibling| SizeTerm {
                            name: sibling.decl.name.as_str(),
                            direction: sibling.direction,
                        })
                        .ok_or_else(|| CodegenError::InvalidSizeArgument {
                            argument: decl.name.clone(),
                            function: function.name.clone(),
                            index,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ArraySizing {
                name: decl.name.as_str(),
                terms,
            })
        })
        .collect()
}

/// Emits a complete wrapper method: header, marshaling, native call, and
/// result reconstruction.
#[derive(Debug, Clone)]
pub struct MethodBlock<'a> {
    plan: MethodPlan<'a>,
    handle_name: &'a str,
    releases_handle: bool,
}

impl<'a> MethodBlock<'a> {
    pub fn new(
        function: &'a FunctionDecl,
        naming: &MethodNaming<'_>,
        handle_name: &'a str,
    ) -> Result<Self, CodegenError> {
        let plan = MethodPlan::new(function, naming)?;
        debug!(
            symbol = %function.name,
            method = %plan.signature.name,
            inputs = plan.signature.num_inputs,
            outputs = plan.signature.num_outputs,
            "planned wrapper method"
        );
        Ok(Self {
            plan,
            handle_name,
            releases_handle: false,
        })
    }

    /// Marks the method that closes the session. It resets the handle to
    /// the sentinel once the native close succeeds, so the destructor does
    /// not close it again.
    pub fn releasing_handle(mut self, releases: bool) -> Self {
        self.releases_handle = releases && self.plan.threads_handle();
        self
    }

    fn call_section(&self) -> Vec<String> {
        let mut lines = call::call_lines(&self.plan, self.handle_name);
        if self.releases_handle {
            lines.push(format!("self.{}.value = {HANDLE_SENTINEL}", self.handle_name));
        }
        lines
    }
}

impl Emit for MethodBlock<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        let results = ResultAssembly::new(&self.plan);
        let sections = [
            marshal::input_conversions(&self.plan),
            marshal::output_placeholders(&self.plan),
            self.call_section(),
            results.extraction_lines(),
            results.return_line().into_iter().collect(),
        ];

        self.plan.signature.emit_header(out);
        out.nested(|body| {
            let mut first = true;
            for section in sections.iter().filter(|lines| !lines.is_empty()) {
                if !first {
                    body.blank();
                }
                first = false;
                for line in section {
                    body.line(line);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn plan(function: &FunctionDecl) -> Result<MethodPlan<'_>, CodegenError> {
        let aliases = BTreeMap::new();
        MethodPlan::new(function, &MethodNaming::new("lib_", &aliases))
    }

    fn vector_getter(size: ArgumentDecl, sizes: &[usize]) -> FunctionDecl {
        FunctionDecl::new("lib_GetVector")
            .arg(ArgumentDecl::new("handle", "int").handle())
            .arg(size)
            .arg(
                ArgumentDecl::new("values", "double")
                    .pointer(2)
                    .out()
                    .array(sizes.iter().copied()),
            )
    }

    fn invalid_size(index: usize) -> CodegenError {
        CodegenError::InvalidSizeArgument {
            argument: "values".into(),
            function: "lib_GetVector".into(),
            index,
        }
    }

    #[test]
    fn sizes_resolve_to_scalar_siblings() {
        let function = vector_getter(ArgumentDecl::new("count", "int").pointer(1).out().sizearg(), &[1]);
        let plan = plan(&function).expect("plan builds");

        assert_eq!(
            plan.arrays,
            vec![ArraySizing {
                name: "values",
                terms: vec![SizeTerm {
                    name: "count",
                    direction: Direction::Output,
                }],
            }]
        );
    }

    #[test]
    fn output_array_without_sizes_is_rejected() {
        let function = vector_getter(ArgumentDecl::new("count", "int"), &[]);
        assert_eq!(
            plan(&function).map(|_| ()),
            Err(CodegenError::UnsizedArray {
                argument: "values".into(),
                function: "lib_GetVector".into(),
            })
        );
    }

    #[test]
    fn handle_cannot_size_an_array() {
        let function = vector_getter(ArgumentDecl::new("count", "int"), &[0]);
        assert_eq!(plan(&function).map(|_| ()), Err(invalid_size(0)));
    }

    #[test]
    fn text_cannot_size_an_array() {
        let function = vector_getter(ArgumentDecl::new("path", "char").string(), &[1]);
        assert_eq!(plan(&function).map(|_| ()), Err(invalid_size(1)));
    }

    #[test]
    fn array_cannot_size_another_array() {
        let function = vector_getter(
            ArgumentDecl::new("weights", "float").array(Vec::<usize>::new()),
            &[1],
        );
        assert_eq!(plan(&function).map(|_| ()), Err(invalid_size(1)));
    }

    #[test]
    fn array_cannot_size_itself() {
        let function = vector_getter(ArgumentDecl::new("count", "int"), &[2]);
        assert_eq!(plan(&function).map(|_| ()), Err(invalid_size(2)));
    }

    #[test]
    fn size_index_past_the_end_is_rejected() {
        let function = vector_getter(ArgumentDecl::new("count", "int"), &[7]);
        assert_eq!(plan(&function).map(|_| ()), Err(invalid_size(7)));
    }

    #[test]
    fn explicit_return_convention_needs_a_value() {
        let mut function = FunctionDecl::new("lib_GetCount").arg(ArgumentDecl::new("handle", "int").handle());
        function.returns_error = false;

        assert_eq!(
            plan(&function).map(|_| ()),
            Err(CodegenError::MissingReturnValue {
                function: "lib_GetCount".into(),
            })
        );
    }

    #[test]
    fn parameter_named_like_a_module_helper_is_rejected() {
        let function = FunctionDecl::new("lib_Load")
            .arg(ArgumentDecl::new("handle", "int").handle())
            .arg(ArgumentDecl::new("ctypes", "int"));
        assert_eq!(
            plan(&function).map(|_| ()),
            Err(CodegenError::NameCollision {
                name: "ctypes".into(),
                function: "lib_Load".into(),
            })
        );
    }

    #[test]
    fn input_sequence_type_may_not_shadow_a_parameter() {
        let function = FunctionDecl::new("lib_AddPoints")
            .arg(ArgumentDecl::new("array_t_points", "int"))
            .arg(ArgumentDecl::new("points", "float").array(Vec::<usize>::new()));
        assert!(matches!(
            plan(&function),
            Err(CodegenError::NameCollision { name, .. }) if name == "array_t_points"
        ));
    }

    #[test]
    fn bound_names_cover_locals_in_binding_order() {
        let function = FunctionDecl::new("lib_GetMatrix")
            .arg(ArgumentDecl::new("handle", "int").handle())
            .arg(ArgumentDecl::new("rows", "int"))
            .arg(ArgumentDecl::new("values", "double").pointer(2).out().array([1]));
        let plan = plan(&function).expect("plan builds");

        assert_eq!(
            plan.bound_names(),
            vec![
                "rows",
                "_c_rows",
                "_c_values",
                "errorCode",
                "values_size",
                "_py_values",
            ]
        );
    }

    #[test]
    fn release_requires_a_threaded_handle() {
        let aliases = BTreeMap::new();
        let naming = MethodNaming::new("lib_", &aliases);
        let close = FunctionDecl::new("lib_Close").arg(ArgumentDecl::new("handle", "int").handle());
        let shutdown = FunctionDecl::new("lib_Shutdown");

        let with_handle = MethodBlock::new(&close, &naming, "_handle")
            .expect("plan builds")
            .releasing_handle(true)
            .render();
        let without_handle = MethodBlock::new(&shutdown, &naming, "_handle")
            .expect("plan builds")
            .releasing_handle(true)
            .render();

        assert!(with_handle.ends_with("    self._handle.value = -1\n"));
        assert!(!without_handle.contains("self._handle"));
    }
}
