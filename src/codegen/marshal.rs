//! Pre-call marshaling: converts user inputs into their native form and
//! allocates placeholders the native function writes its outputs into.

use super::classify::{ArgRole, ClassifiedArg};
use super::method::MethodPlan;

/// Name of the native-side variable holding an argument.
pub fn native_var(name: &str) -> String {
    format!("_c_{name}")
}

/// Name of the `ctypes` array type built for an input sequence.
pub fn array_type_var(name: &str) -> String {
    format!("array_t_{name}")
}

pub fn input_conversions(plan: &MethodPlan<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    for arg in plan.inputs() {
        lines.extend(convert_input(arg));
    }
    if !lines.is_empty() {
        lines.insert(0, "# input arg conversion".to_string());
    }
    lines
}

pub fn output_placeholders(plan: &MethodPlan<'_>) -> Vec<String> {
    let mut lines: Vec<String> = plan.outputs().map(prepare_output).collect();
    if !lines.is_empty() {
        lines.insert(0, "# output arg preparation".to_string());
    }
    lines
}

fn convert_input(arg: &ClassifiedArg<'_>) -> Vec<String> {
    let name = arg.name();
    let var = native_var(name);
    match arg.role {
        ArgRole::Text => vec![format!("{var} = ctypes.c_char_p(_to_native_text({name}))")],
        ArgRole::Scalar(scalar) => vec![format!("{var} = {}({name})", scalar.ctype())],
        ArgRole::Array(scalar) => {
            let array_type = array_type_var(name);
            vec![
                format!("{array_type} = {} * len({name})", scalar.ctype()),
                format!("{var} = {array_type}(*{name})"),
            ]
        }
        ArgRole::Handle => Vec::new(),
    }
}

fn prepare_output(arg: &ClassifiedArg<'_>) -> String {
    let var = native_var(arg.name());
    match arg.role {
        ArgRole::Array(scalar) => format!("{var} = ctypes.POINTER({})()", scalar.ctype()),
        ArgRole::Text => format!("{var} = ctypes.c_char_p()"),
        ArgRole::Scalar(scalar) => format!("{var} = {}()", scalar.ctype()),
        ArgRole::Handle => String::new(),
    }
}
