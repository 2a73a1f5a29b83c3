//! Generator configuration.
//!
//! Settings come from an optional YAML, JSON or (with the `toml-config`
//! feature) TOML file and are then overridden by command line flags.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use ctwrap_model::DeclarationModel;
use ctwrap_utils::suggest::find_best_match;
use serde::{Deserialize, Serialize};

use crate::codegen::PythonVersion;

const DEFAULT_MIN_VERSION: PythonVersion = (3, 6);
const DEFAULT_MAX_VERSION: PythonVersion = (4, 0);
const DEFAULT_HANDLE_NAME: &str = "_handle";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    name_prefix: Option<String>,
    library_name: Option<String>,
    license_text: Option<String>,
    license_file: Option<PathBuf>,
    user_functions: Option<String>,
    user_functions_file: Option<PathBuf>,
    close_function_name: Option<String>,
    aliases: BTreeMap<String, String>,
    python_min_version: Option<[u32; 2]>,
    python_max_version: Option<[u32; 2]>,
    handle_name: Option<String>,
}

/// Values supplied on the command line; each one replaces the file setting.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub name_prefix: Option<String>,
    pub library_name: Option<String>,
    pub aliases: Vec<(String, String)>,
    pub close_function_name: Option<String>,
    pub license_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorConfig {
    /// Stripped from native symbols to derive method names.
    pub name_prefix: String,
    pub library_name: String,
    pub license_text: Option<String>,
    /// Methods pasted verbatim into the wrapper class.
    pub user_functions: Option<String>,
    /// Native symbol or user method called by the destructor.
    pub close_function_name: Option<String>,
    pub aliases: BTreeMap<String, String>,
    pub python_min_version: PythonVersion,
    /// Exclusive upper bound.
    pub python_max_version: PythonVersion,
    pub handle_name: String,
}

impl GeneratorConfig {
    pub fn new(library_name: impl Into<String>) -> Self {
        Self {
            name_prefix: String::new(),
            library_name: library_name.into(),
            license_text: None,
            user_functions: None,
            close_function_name: None,
            aliases: BTreeMap::new(),
            python_min_version: DEFAULT_MIN_VERSION,
            python_max_version: DEFAULT_MAX_VERSION,
            handle_name: DEFAULT_HANDLE_NAME.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn with_alias(mut self, symbol: impl Into<String>, method: impl Into<String>) -> Self {
        self.aliases.insert(symbol.into(), method.into());
        self
    }

    pub fn with_close_function(mut self, name: impl Into<String>) -> Self {
        self.close_function_name = Some(name.into());
        self
    }

    pub fn with_user_functions(mut self, source: impl Into<String>) -> Self {
        self.user_functions = Some(source.into());
        self
    }

    /// Loads the optional config file, applies `overrides`, and resolves
    /// referenced files. Paths inside the file are relative to the file.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let (raw, base_dir) = match path {
            Some(path) => {
                let raw = read_raw(path)?;
                let base = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                (raw, base)
            }
            None => (RawConfig::default(), PathBuf::new()),
        };
        Self::from_raw(raw, &base_dir, overrides)
    }

    fn from_raw(mut raw: RawConfig, base_dir: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(prefix) = &overrides.name_prefix {
            raw.name_prefix = Some(prefix.clone());
        }
        if let Some(library) = &overrides.library_name {
            raw.library_name = Some(library.clone());
        }
        if let Some(close) = &overrides.close_function_name {
            raw.close_function_name = Some(close.clone());
        }
        for (symbol, method) in &overrides.aliases {
            raw.aliases.insert(symbol.clone(), method.clone());
        }

        let library_name = raw
            .library_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| anyhow!("library_name is not configured (set it in the config file or pass --library)"))?;

        let license_text = match (&overrides.license_file, raw.license_file) {
            (Some(cli_file), _) => Some(read_text(cli_file, "license")?),
            (None, Some(file)) => Some(read_text(&base_dir.join(file), "license")?),
            (None, None) => raw.license_text,
        };
        let user_functions = match raw.user_functions_file {
            Some(file) => Some(read_text(&base_dir.join(file), "user functions")?),
            None => raw.user_functions,
        };

        let config = Self {
            name_prefix: raw.name_prefix.unwrap_or_default(),
            library_name,
            license_text,
            user_functions,
            close_function_name: raw.close_function_name.filter(|name| !name.is_empty()),
            aliases: raw.aliases,
            python_min_version: raw
                .python_min_version
                .map_or(DEFAULT_MIN_VERSION, |[major, minor]| (major, minor)),
            python_max_version: raw
                .python_max_version
                .map_or(DEFAULT_MAX_VERSION, |[major, minor]| (major, minor)),
            handle_name: raw
                .handle_name
                .unwrap_or_else(|| DEFAULT_HANDLE_NAME.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.python_min_version >= self.python_max_version {
            bail!(
                "python_min_version {:?} must be lower than python_max_version {:?}",
                self.python_min_version,
                self.python_max_version
            );
        }
        if !is_identifier(&self.handle_name) {
            bail!("handle_name `{}` is not a valid attribute name", self.handle_name);
        }
        for (symbol, method) in &self.aliases {
            if !is_identifier(method) {
                bail!("alias for `{symbol}` is not a valid method name: `{method}`");
            }
        }
        Ok(())
    }

    /// Wrapper class name: first letter upper-cased, the rest lower-cased.
    pub fn class_name(&self) -> String {
        let mut chars = self.library_name.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        }
    }

    /// Config entries that name symbols absent from `model`. These are not
    /// fatal: an unused alias changes nothing, and a close function may be a
    /// user-supplied method.
    pub fn unresolved_references(&self, model: &DeclarationModel) -> Vec<String> {
        let symbols: Vec<&str> = model.symbols().collect();
        let mut warnings = Vec::new();

        for symbol in self.aliases.keys() {
            if symbols.contains(&symbol.as_str()) {
                continue;
            }
            let mut message = format!("alias refers to unknown native function `{symbol}`");
            if let Some(candidate) = find_best_match(symbol, symbols.iter().copied()) {
                message.push_str(&format!(" (did you mean `{candidate}`?)"));
            }
            warnings.push(message);
        }

        if let Some(close) = &self.close_function_name {
            let user_defined = self
                .user_functions
                .as_deref()
                .is_some_and(|source| defines_method(source, close));
            if !symbols.contains(&close.as_str()) && !user_defined {
                let mut message = format!(
                    "close function `{close}` is neither a native function nor a user method"
                );
                if let Some(candidate) = find_best_match(close, symbols.iter().copied()) {
                    message.push_str(&format!(" (did you mean `{candidate}`?)"));
                }
                warnings.push(message);
            }
        }

        warnings
    }
}

/// Parses a `native=method` alias flag.
pub fn parse_alias(value: &str) -> Result<(String, String), String> {
    let (symbol, method) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NATIVE=METHOD, got `{value}`"))?;
    let (symbol, method) = (symbol.trim(), method.trim());
    if symbol.is_empty() || method.is_empty() {
        return Err(format!("expected NATIVE=METHOD, got `{value}`"));
    }
    Ok((symbol.to_string(), method.to_string()))
}

fn read_raw(path: &Path) -> Result<RawConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display())),
        Some("toml") => parse_toml(&text, path),
        Some("yaml" | "yml") | None => serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display())),
        Some(other) => bail!(
            "unsupported config format `.{other}` for {} (use .yaml, .json or .toml)",
            path.display()
        ),
    }
}

#[cfg(feature = "toml-config")]
fn parse_toml(text: &str, path: &Path) -> Result<RawConfig> {
    toml::from_str(text).with_context(|| format!("failed to parse config {}", path.display()))
}

#[cfg(not(feature = "toml-config"))]
fn parse_toml(_text: &str, path: &Path) -> Result<RawConfig> {
    bail!(
        "cannot read {}: TOML support not enabled. Enable the 'toml-config' feature.",
        path.display()
    )
}

fn read_text(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {what} file {}", path.display()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn defines_method(source: &str, name: &str) -> bool {
    let needle = format!("def {name}(");
    source
        .lines()
        .any(|line| line.trim_start().starts_with(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctwrap_model::{ArgumentDecl, FunctionDecl};

    fn raw_with_library() -> RawConfig {
        RawConfig {
            library_name: Some("TIXI".into()),
            ..RawConfig::default()
        }
    }

    #[test]
    fn class_name_capitalises_library() {
        assert_eq!(GeneratorConfig::new("TIXI").class_name(), "Tixi");
        assert_eq!(GeneratorConfig::new("tigl3").class_name(), "Tigl3");
    }

    #[test]
    fn library_name_is_required() {
        let err = GeneratorConfig::from_raw(RawConfig::default(), Path::new(""), &ConfigOverrides::default())
            .expect_err("missing library");
        assert!(err.to_string().contains("library_name"));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut raw = raw_with_library();
        raw.name_prefix = Some("tixi".into());
        raw.aliases.insert("tixiOpen".into(), "open".into());

        let overrides = ConfigOverrides {
            name_prefix: Some("lib_".into()),
            aliases: vec![("tixiOpen".into(), "openDocument".into())],
            close_function_name: Some("tixiClose".into()),
            ..ConfigOverrides::default()
        };
        let config = GeneratorConfig::from_raw(raw, Path::new(""), &overrides).expect("resolves");

        assert_eq!(config.name_prefix, "lib_");
        assert_eq!(config.aliases["tixiOpen"], "openDocument");
        assert_eq!(config.close_function_name.as_deref(), Some("tixiClose"));
        assert_eq!(config.python_min_version, (3, 6));
        assert_eq!(config.handle_name, "_handle");
    }

    #[test]
    fn version_range_must_be_ordered() {
        let mut raw = raw_with_library();
        raw.python_min_version = Some([4, 0]);
        raw.python_max_version = Some([3, 6]);
        assert!(GeneratorConfig::from_raw(raw, Path::new(""), &ConfigOverrides::default()).is_err());
    }

    #[test]
    fn alias_flag_parsing() {
        assert_eq!(
            parse_alias("tixiOpenDocument=open"),
            Ok(("tixiOpenDocument".into(), "open".into()))
        );
        assert!(parse_alias("missing").is_err());
        assert!(parse_alias("=open").is_err());
    }

    #[test]
    fn unknown_alias_gets_suggestion() {
        let model = DeclarationModel {
            functions: vec![
                FunctionDecl::new("tixiOpenDocument")
                    .arg(ArgumentDecl::new("handle", "int").pointer(1).out().handle()),
            ],
            ..DeclarationModel::default()
        };
        let config = GeneratorConfig::new("tixi")
            .with_alias("tixiOpenDocumnt", "open")
            .with_close_function("close")
            .with_user_functions("def close(self):\n    pass\n");

        let warnings = config.unresolved_references(&model);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("did you mean `tixiOpenDocument`"));
    }
}
