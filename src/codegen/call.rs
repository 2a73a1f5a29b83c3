use super::classify::ArgRole;
use super::marshal::native_var;
use super::method::MethodPlan;

/// Variable that captures a status code before it is checked.
pub const STATUS_VAR: &str = "errorCode";

/// Emits the native invocation. Status-code functions feed the result
/// straight into `catch_error`; explicit-return functions stage it under the
/// return value's native name without checking it.
pub fn call_lines(plan: &MethodPlan<'_>, handle_name: &str) -> Vec<String> {
    let symbol = plan.symbol();
    let mut lines = vec!["# call to native function".to_string()];

    if let Some(ret) = &plan.return_value {
        lines.push(format!("self.lib.{symbol}.restype = {}", ret.role.restype()));
    }

    let invocation = format!("self.lib.{symbol}({})", call_arguments(plan, handle_name).join(", "));

    match &plan.return_value {
        None => {
            lines.push(format!("{STATUS_VAR} = {invocation}"));
            let mut check = vec![STATUS_VAR.to_string()];
            check.extend(plan.signature.params.iter().cloned());
            lines.push(format!("catch_error({})", check.join(", ")));
        }
        Some(ret) => lines.push(format!("{} = {invocation}", native_var(&ret.decl.name))),
    }

    lines
}

/// Positional arguments of the native call.
pub fn call_arguments(plan: &MethodPlan<'_>, handle_name: &str) -> Vec<String> {
    plan.args
        .iter()
        .map(|arg| match (arg.role, arg.is_output()) {
            (ArgRole::Handle, false) => format!("self.{handle_name}"),
            (ArgRole::Handle, true) => format!("ctypes.byref(self.{handle_name})"),
            (_, true) => format!("ctypes.byref({})", native_var(arg.name())),
            (_, false) => native_var(arg.name()),
        })
        .collect()
}
