use std::collections::BTreeMap;

use ctwrap_model::FunctionDecl;

use super::builder::CodeBuilder;

/// Derives wrapper method names from native symbols.
#[derive(Debug, Clone, Copy)]
pub struct MethodNaming<'a> {
    prefix: &'a str,
    aliases: &'a BTreeMap<String, String>,
}

impl<'a> MethodNaming<'a> {
    pub fn new(prefix: &'a str, aliases: &'a BTreeMap<String, String>) -> Self {
        Self { prefix, aliases }
    }

    /// An alias wins; otherwise the prefix is stripped and the next character
    /// lower-cased (`tixiGetValue` -> `getValue`). Symbols without the prefix
    /// are used unchanged.
    pub fn method_name(&self, symbol: &str) -> String {
        if let Some(alias) = self.aliases.get(symbol) {
            return alias.clone();
        }

        let Some(rest) = symbol.strip_prefix(self.prefix) else {
            return symbol.to_string();
        };
        let mut chars = rest.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => symbol.to_string(),
        }
    }
}

/// The wrapper-visible shape of one native function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    /// User-facing parameters in declaration order, `self` excluded.
    pub params: Vec<String>,
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub handle_index: Option<usize>,
}

impl MethodSignature {
    pub fn header(&self) -> String {
        let mut header = format!("def {}(self", self.name);
        for param in &self.params {
            header.push_str(", ");
            header.push_str(param);
        }
        header.push_str("):");
        header
    }

    pub fn emit_header(&self, out: &mut CodeBuilder) {
        out.line(self.header());
    }
}

/// Builds the method signature. The handle (when threaded) is neither a
/// parameter nor counted as an input or output.
pub fn build_signature(function: &FunctionDecl, naming: &MethodNaming<'_>) -> MethodSignature {
    let handle_index = function.handle_index();
    let mut params = Vec::new();
    let mut num_outputs = 0;

    for (index, arg) in function.arguments.iter().enumerate() {
        if Some(index) == handle_index {
            continue;
        }
        if arg.is_outarg {
            num_outputs += 1;
        } else {
            params.push(arg.name.clone());
        }
    }

    MethodSignature {
        name: naming.method_name(&function.name),
        num_inputs: params.len(),
        params,
        num_outputs,
        handle_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctwrap_model::ArgumentDecl;

    fn aliases(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }

    #[test]
    fn strips_prefix_and_lowercases() {
        let table = BTreeMap::new();
        let naming = MethodNaming::new("lib_", &table);
        assert_eq!(naming.method_name("lib_OpenFile"), "openFile");
        assert_eq!(naming.method_name("other_Call"), "other_Call");
        assert_eq!(naming.method_name("lib_"), "lib_");
    }

    #[test]
    fn alias_overrides_prefix_stripping() {
        let table = aliases(&[("lib_OpenFile", "open")]);
        let naming = MethodNaming::new("lib_", &table);
        assert_eq!(naming.method_name("lib_OpenFile"), "open");
    }

    #[test]
    fn handle_and_outputs_are_not_parameters() {
        let function = FunctionDecl::new("lib_GetValue")
            .arg(ArgumentDecl::new("handle", "int").handle())
            .arg(ArgumentDecl::new("key", "char").string())
            .arg(ArgumentDecl::new("value", "double").pointer(1).out());
        let table = BTreeMap::new();
        let signature = build_signature(&function, &MethodNaming::new("lib_", &table));

        assert_eq!(signature.header(), "def getValue(self, key):");
        assert_eq!(signature.num_inputs, 1);
        assert_eq!(signature.num_outputs, 1);
        assert_eq!(signature.handle_index, Some(0));
    }

    #[test]
    fn unthreaded_handle_is_a_parameter() {
        let function = FunctionDecl::new("lib_Inspect")
            .arg(ArgumentDecl::new("handle", "int").handle())
            .without_handle();
        let table = BTreeMap::new();
        let signature = build_signature(&function, &MethodNaming::new("lib_", &table));

        assert_eq!(signature.header(), "def inspect(self, handle):");
        assert_eq!(signature.handle_index, None);
    }
}
