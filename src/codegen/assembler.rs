use ctwrap_model::DeclarationModel;
use rayon::prelude::*;
use tracing::{debug, info};

use super::builder::{CodeBuilder, Emit, join_blocks};
use super::error::CodegenError;
use super::method::MethodBlock;
use super::signature::MethodNaming;
use super::support::{
    ClassHeader, Constructor, Destructor, EnumBlock, ErrorCheckBlock, ExceptionBlock, Preamble,
    UserFunctions,
};
use crate::config::GeneratorConfig;

/// Turns a declaration model into one self-contained wrapper module.
#[derive(Debug, Clone)]
pub struct WrapperGenerator {
    config: GeneratorConfig,
}

impl WrapperGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    fn naming(&self) -> MethodNaming<'_> {
        MethodNaming::new(&self.config.name_prefix, &self.config.aliases)
    }

    /// Method name the destructor calls. A native symbol resolves to its
    /// generated method; anything else is taken as a user method name.
    pub fn close_method(&self, model: &DeclarationModel) -> Option<String> {
        let close = self.config.close_function_name.as_deref()?;
        Some(match model.find_function(close) {
            Some(function) => self.naming().method_name(&function.name),
            None => close.to_string(),
        })
    }

    /// Generates the complete module. Every method is planned before any
    /// text is returned, so a failing declaration yields no output at all.
    pub fn generate(&self, model: &DeclarationModel) -> Result<String, CodegenError> {
        let methods = self.generate_methods(model)?;

        let class_name = self.config.class_name();
        let status_enum = model.status_codes();
        let close_method = self.close_method(model);

        let mut blocks = vec![
            Preamble {
                license: self.config.license_text.as_deref(),
            }
            .render(),
        ];
        blocks.extend(model.enums.iter().map(|decl| EnumBlock(decl).render()));
        blocks.push(
            ExceptionBlock {
                class_name: &class_name,
                status_enum,
            }
            .render(),
        );
        blocks.push(
            ErrorCheckBlock {
                class_name: &class_name,
                status_enum,
            }
            .render(),
        );
        blocks.push(
            ClassHeader {
                class_name: &class_name,
            }
            .render(),
        );
        blocks.push(member(&Constructor {
            class_name: &class_name,
            library_name: &self.config.library_name,
            handle_name: &self.config.handle_name,
            min_version: self.config.python_min_version,
            max_version: self.config.python_max_version,
        }));
        if let Some(close_method) = &close_method {
            blocks.push(member(&Destructor {
                close_method,
                handle_name: &self.config.handle_name,
            }));
        }
        if let Some(source) = &self.config.user_functions {
            blocks.push(member(&UserFunctions { source }));
        }
        blocks.extend(methods);

        info!(
            class = %class_name,
            enums = model.enums.len(),
            methods = model.functions.len(),
            "generated wrapper module"
        );
        Ok(join_blocks(blocks))
    }

    /// Renders one method per declaration. Methods are independent, so they
    /// are built in parallel and collected back in declaration order.
    pub fn generate_methods(&self, model: &DeclarationModel) -> Result<Vec<String>, CodegenError> {
        let naming = self.naming();
        let handle_name = self.config.handle_name.as_str();
        let close_symbol = self.config.close_function_name.as_deref();
        let methods = model
            .functions
            .par_iter()
            .map(|function| -> Result<String, CodegenError> {
                let block = MethodBlock::new(function, &naming, handle_name)?
                    .releasing_handle(close_symbol == Some(function.name.as_str()));
                Ok(member(&block))
            })
            .collect::<Result<Vec<_>, CodegenError>>()?;
        debug!(count = methods.len(), "rendered wrapper methods");
        Ok(methods)
    }
}

/// Renders a class member one level deep.
fn member(block: &impl Emit) -> String {
    let mut out = CodeBuilder::at_depth(1);
    block.emit(&mut out);
    out.finish()
}

#[cfg(test)]
mod tests {
    use ctwrap_model::{ArgumentDecl, EnumDecl, FunctionDecl};

    use super::*;

    fn model() -> DeclarationModel {
        DeclarationModel {
            status_enum: Some("ReturnCode".into()),
            enums: vec![EnumDecl::new("ReturnCode", ["SUCCESS", "FAILED"])],
            functions: vec![
                FunctionDecl::new("tixiOpenDocument")
                    .arg(ArgumentDecl::new("path", "char").string())
                    .arg(ArgumentDecl::new("handle", "int").pointer(1).out().handle()),
                FunctionDecl::new("tixiCloseDocument")
                    .arg(ArgumentDecl::new("handle", "int").handle()),
            ],
        }
    }

    #[test]
    fn close_symbol_resolves_to_method_name() {
        let generator = WrapperGenerator::new(
            GeneratorConfig::new("tixi")
                .with_prefix("tixi")
                .with_close_function("tixiCloseDocument"),
        );
        assert_eq!(
            generator.close_method(&model()).as_deref(),
            Some("closeDocument")
        );

        let user = WrapperGenerator::new(GeneratorConfig::new("tixi").with_close_function("shutdown"));
        assert_eq!(user.close_method(&model()).as_deref(), Some("shutdown"));
    }

    #[test]
    fn blocks_follow_fixed_order() {
        let generator = WrapperGenerator::new(
            GeneratorConfig::new("tixi")
                .with_prefix("tixi")
                .with_close_function("tixiCloseDocument")
                .with_user_functions("def version(self):\n    return 1"),
        );
        let output = generator.generate(&model()).expect("generates");

        let order = [
            "import sys, ctypes",
            "class ReturnCode(object):",
            "class TixiException(Exception):",
            "def catch_error(",
            "class Tixi(object):",
            "    def __init__(self):",
            "    def __del__(self):",
            "    def version(self):",
            "    def openDocument(self, path):",
            "    def closeDocument(self):",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| output.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn no_destructor_without_close_function() {
        let generator = WrapperGenerator::new(GeneratorConfig::new("tixi").with_prefix("tixi"));
        let output = generator.generate(&model()).expect("generates");
        assert!(!output.contains("__del__"));
    }

    #[test]
    fn only_the_close_method_resets_the_handle() {
        let generator = WrapperGenerator::new(
            GeneratorConfig::new("tixi")
                .with_prefix("tixi")
                .with_close_function("tixiCloseDocument"),
        );
        let methods = generator.generate_methods(&model()).expect("generates");

        assert!(!methods[0].contains("self._handle.value = -1"));
        assert!(methods[1].ends_with(
            "        catch_error(errorCode)\n        self._handle.value = -1\n"
        ));
    }

    #[test]
    fn failing_declaration_aborts_generation() {
        let mut broken = model();
        broken.functions.push(
            FunctionDecl::new("tixiSetValue")
                .arg(ArgumentDecl::new("handle", "int").handle())
                .arg(ArgumentDecl::new("value", "double").pointer(1)),
        );
        let generator = WrapperGenerator::new(GeneratorConfig::new("tixi").with_prefix("tixi"));
        assert!(matches!(
            generator.generate(&broken),
            Err(CodegenError::Conversion { .. })
        ));
    }
}
