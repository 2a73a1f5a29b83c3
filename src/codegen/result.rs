//! Rebuilds user-facing values from native outputs.
//!
//! Extraction runs in two passes. Scalars, text and the explicit return
//! value come first so that array lengths computed in the second pass may
//! refer to any output scalar, whatever its position in the declaration.

use super::classify::ArgRole;
use super::error::Direction;
use super::marshal::native_var;
use super::method::{MethodPlan, SizeTerm};

/// Name of the user-side variable holding a reconstructed output.
pub fn python_var(name: &str) -> String {
    format!("_py_{name}")
}

/// Name of the local holding an output array's element count.
pub fn size_var(name: &str) -> String {
    format!("{name}_size")
}

#[derive(Debug, Clone, Copy)]
struct OutputSlot<'p> {
    name: &'p str,
    role: ArgRole,
    is_return: bool,
    visible: bool,
}

#[derive(Debug)]
pub struct ResultAssembly<'p> {
    plan: &'p MethodPlan<'p>,
    slots: Vec<OutputSlot<'p>>,
}

impl<'p> ResultAssembly<'p> {
    pub fn new(plan: &'p MethodPlan<'p>) -> Self {
        let mut slots = Vec::new();

        if let Some(ret) = &plan.return_value {
            slots.push(OutputSlot {
                name: &ret.decl.name,
                role: ret.role.into(),
                is_return: true,
                visible: !ret.decl.is_handle && !ret.decl.is_sizearg,
            });
        }

        for arg in plan.args.iter().filter(|arg| arg.is_output()) {
            slots.push(OutputSlot {
                name: arg.name(),
                role: arg.role,
                is_return: false,
                visible: !arg.decl.is_handle && !arg.decl.is_sizearg,
            });
        }

        Self { plan, slots }
    }

    /// Statements that pull native outputs into `_py_` variables.
    pub fn extraction_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for slot in &self.slots {
            let py = python_var(slot.name);
            let c = native_var(slot.name);
            match (slot.role, slot.is_return) {
                (ArgRole::Text, true) => lines.push(format!("{py} = _from_native_text({c})")),
                (ArgRole::Text, false) => {
                    lines.push(format!("{py} = _from_native_text({c}.value)"));
                }
                (ArgRole::Scalar(_), true) => lines.push(format!("{py} = {c}")),
                (ArgRole::Scalar(_), false) => lines.push(format!("{py} = {c}.value")),
                (ArgRole::Array(_) | ArgRole::Handle, _) => {}
            }
        }

        for array in &self.plan.arrays {
            let size = size_var(array.name);
            let factors: Vec<String> = array.terms.iter().map(size_factor).collect();
            lines.push(format!("{size} = {}", factors.join(" * ")));
            lines.push(format!(
                "{} = [{}[i] for i in range({size})]",
                python_var(array.name),
                native_var(array.name)
            ));
        }

        lines
    }

    /// Values handed back to the caller, in output order.
    pub fn returned_values(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|slot| slot.visible && slot.role != ArgRole::Handle)
            .map(|slot| python_var(slot.name))
            .collect()
    }

    pub fn return_line(&self) -> Option<String> {
        match self.returned_values().as_slice() {
            [] => None,
            [single] => Some(format!("return {single}")),
            many => Some(format!("return ({})", many.join(", "))),
        }
    }
}

/// Inputs contribute their raw parameter, outputs their extracted value.
fn size_factor(term: &SizeTerm<'_>) -> String {
    match term.direction {
        Direction::Input => term.name.to_string(),
        Direction::Output => python_var(term.name),
    }
}
