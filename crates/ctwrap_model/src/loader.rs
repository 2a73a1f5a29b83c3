use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ctwrap_span::Span;
use ctwrap_utils::errors::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::decl::{ArgumentDecl, DeclarationModel, EnumDecl, FunctionDecl};
use crate::validate::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Yaml,
    Json,
}

impl ModelFormat {
    /// `.json` files are read as JSON, everything else as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read declaration model {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{source_id}: {message}")]
    Syntax {
        source_id: String,
        message: String,
        span: Span,
    },
    #[error("{source_id}: {error}")]
    Invalid {
        source_id: String,
        span: Option<Span>,
        #[source]
        error: ModelError,
    },
}

impl LoadError {
    /// A renderable diagnostic for errors that point into the document.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        match self {
            LoadError::Io { .. } => None,
            LoadError::Syntax {
                source_id,
                message,
                span,
            } => Some(
                Diagnostic::error(source_id.as_str(), *span, "malformed declaration model")
                    .with_label(message.as_str()),
            ),
            LoadError::Invalid {
                source_id,
                span,
                error,
            } => {
                let diagnostic = Diagnostic::error(
                    source_id.as_str(),
                    span.unwrap_or_default(),
                    error.to_string(),
                )
                .with_label(format!("declared as `{}`", error.subject()));
                Some(match error.help() {
                    Some(help) => diagnostic.with_help(help),
                    None => diagnostic,
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    #[serde(default, alias = "returncode")]
    status_enum: Option<String>,
    #[serde(default)]
    enums: Vec<RawEnum>,
    #[serde(default)]
    functions: Vec<RawFunction>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEnum {
    name: String,
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFunction {
    name: String,
    /// Defaults to whether any argument is flagged as the handle.
    #[serde(default)]
    uses_handle: Option<bool>,
    /// Defaults to `true` unless a `return_value` is declared.
    #[serde(default)]
    returns_error: Option<bool>,
    #[serde(default)]
    arguments: Vec<RawArgument>,
    #[serde(default)]
    return_value: Option<RawArgument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArgument {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    npointer: u32,
    #[serde(default, alias = "is_handle")]
    handle: bool,
    #[serde(default, alias = "is_outarg")]
    out: bool,
    #[serde(default, alias = "is_array")]
    array: bool,
    #[serde(default, alias = "is_string")]
    string: bool,
    #[serde(default, alias = "is_sizearg")]
    sizearg: bool,
    #[serde(default)]
    arraysizes: Vec<usize>,
}

impl From<RawArgument> for ArgumentDecl {
    fn from(raw: RawArgument) -> Self {
        Self {
            name: raw.name,
            type_name: raw.type_name,
            npointer: raw.npointer,
            is_handle: raw.handle,
            is_outarg: raw.out,
            is_array: raw.array,
            is_string: raw.string,
            is_sizearg: raw.sizearg,
            arraysizes: raw.arraysizes,
        }
    }
}

impl From<RawFunction> for FunctionDecl {
    fn from(raw: RawFunction) -> Self {
        let arguments: Vec<ArgumentDecl> = raw.arguments.into_iter().map(Into::into).collect();
        let uses_handle = raw
            .uses_handle
            .unwrap_or_else(|| arguments.iter().any(|arg| arg.is_handle));
        let returns_error = raw.returns_error.unwrap_or(raw.return_value.is_none());
        Self {
            name: raw.name,
            uses_handle,
            returns_error,
            arguments,
            return_value: raw.return_value.map(Into::into),
        }
    }
}

impl From<RawModel> for DeclarationModel {
    fn from(raw: RawModel) -> Self {
        Self {
            status_enum: raw.status_enum,
            enums: raw
                .enums
                .into_iter()
                .map(|decl| EnumDecl {
                    name: decl.name,
                    members: decl.members,
                })
                .collect(),
            functions: raw.functions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Reads and validates a declaration model from `path`.
pub fn load_model(path: &Path) -> Result<DeclarationModel, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source_id = path.display().to_string();
    parse_model(&text, ModelFormat::from_path(path), &source_id)
}

/// Parses and validates a declaration model document. `source_id` names the
/// document in errors.
pub fn parse_model(
    text: &str,
    format: ModelFormat,
    source_id: &str,
) -> Result<DeclarationModel, LoadError> {
    let raw: RawModel = match format {
        ModelFormat::Yaml => serde_yaml::from_str(text).map_err(|err| LoadError::Syntax {
            source_id: source_id.to_string(),
            span: err
                .location()
                .map(|location| Span::point(text, location.index()))
                .unwrap_or_default(),
            message: err.to_string(),
        })?,
        ModelFormat::Json => serde_json::from_str(text).map_err(|err| LoadError::Syntax {
            source_id: source_id.to_string(),
            span: Span::from_line_column(text, err.line(), err.column()),
            message: err.to_string(),
        })?,
    };

    let model = DeclarationModel::from(raw);
    model.validate().map_err(|error| LoadError::Invalid {
        source_id: source_id.to_string(),
        span: locate(text, error.subject()),
        error,
    })?;

    debug!(
        source = source_id,
        enums = model.enums.len(),
        functions = model.functions.len(),
        "declaration model loaded"
    );
    Ok(model)
}

fn locate(text: &str, needle: &str) -> Option<Span> {
    if needle.is_empty() {
        return None;
    }
    text.find(needle)
        .map(|start| Span::new(start, start + needle.len()))
}
