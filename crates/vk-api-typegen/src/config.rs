use crate::error::{CodegenError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Fallback for `API_VERSION` when neither the schema nor the options set one
pub const DEFAULT_API_VERSION: &str = "5.131";

/// How top-level enum definitions are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumStyle {
    /// Literal union alias, plus a same-named lookup constant
    #[default]
    Union,
    /// TypeScript `enum` declaration
    Enum,
}

impl FromStr for EnumStyle {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "union" => Ok(Self::Union),
            "enum" => Ok(Self::Enum),
            other => Err(CodegenError::config(format!(
                "unknown enum style \"{other}\", expected \"union\" or \"enum\""
            ))),
        }
    }
}

/// Which methods a run generates.
///
/// Patterns are `*` (everything), `section.*` (a whole section) or an exact
/// method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFilter {
    all: bool,
    sections: BTreeSet<String>,
    methods: BTreeSet<String>,
}

impl Default for MethodFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl MethodFilter {
    pub fn all() -> Self {
        Self {
            all: true,
            sections: BTreeSet::new(),
            methods: BTreeSet::new(),
        }
    }

    /// Build from patterns, each of which may hold a comma separated list.
    ///
    /// No patterns at all selects every method.
    pub fn parse<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Self {
        let mut filter = Self {
            all: false,
            sections: BTreeSet::new(),
            methods: BTreeSet::new(),
        };
        let mut any = false;

        for pattern in patterns
            .into_iter()
            .flat_map(|p| p.split(','))
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            any = true;
            if pattern == "*" {
                filter.all = true;
            } else if let Some(section) = pattern.strip_suffix(".*") {
                filter.sections.insert(section.to_string());
            } else {
                filter.methods.insert(pattern.to_string());
            }
        }

        if !any {
            filter.all = true;
        }
        filter
    }

    pub fn matches(&self, method: &str) -> bool {
        if self.all || self.methods.contains(method) {
            return true;
        }
        method
            .split_once('.')
            .is_some_and(|(section, _)| self.sections.contains(section))
    }
}

impl FromStr for MethodFilter {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::parse([s]))
    }
}

/// Options of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub methods: MethodFilter,
    pub enum_style: EnumStyle,
    /// Overrides the version declared in `methods.json`
    pub api_version: Option<String>,
    /// `(method, response slot)` pairs that are never generated
    pub ignored_responses: BTreeSet<(String, String)>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            methods: MethodFilter::all(),
            enum_style: EnumStyle::default(),
            api_version: None,
            ignored_responses: BTreeSet::from([(
                "storage.get".to_string(),
                "keysResponse".to_string(),
            )]),
        }
    }
}

impl GeneratorOptions {
    /// Defaults with every value set in `config` applied
    pub fn from_config(config: &Config) -> Self {
        let mut options = Self::default();

        if !config.methods.is_empty() {
            options.methods = MethodFilter::parse(config.methods.iter().map(String::as_str));
        }
        if let Some(style) = config.enum_style {
            options.enum_style = style;
        }
        if let Some(version) = &config.api_version {
            options.api_version = Some(version.clone());
        }
        options
            .ignored_responses
            .extend(config.ignored_responses.iter().cloned());

        options
    }

    pub fn is_ignored(&self, method: &str, slot: &str) -> bool {
        self.ignored_responses
            .iter()
            .any(|(m, s)| m == method && s == slot)
    }
}

/// Values read from a KDL config file
///
/// ```kdl
/// methods "users.*" "groups.getById"
/// enum-style "enum"
/// api-version "5.199"
/// ignore-response "storage.get" "keysResponse"
/// output "./typings"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub methods: Vec<String>,
    pub enum_style: Option<EnumStyle>,
    pub api_version: Option<String>,
    pub ignored_responses: Vec<(String, String)>,
    pub output: Option<PathBuf>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_kdl(&text)
    }

    pub fn from_kdl(text: &str) -> Result<Self> {
        let doc = text
            .parse::<kdl::KdlDocument>()
            .map_err(|e| CodegenError::config(format!("failed to parse KDL: {e}")))?;

        let mut config = Config::default();

        for node in doc.nodes() {
            match node.name().value() {
                "methods" => {
                    let patterns = string_args(node)?;
                    if patterns.is_empty() {
                        return Err(CodegenError::config("methods expects at least one pattern"));
                    }
                    config.methods.extend(patterns);
                }
                "enum-style" => {
                    config.enum_style = Some(single_string(node)?.parse()?);
                }
                "api-version" => {
                    config.api_version = Some(single_string(node)?);
                }
                "ignore-response" => match string_args(node)?.as_slice() {
                    [method, slot] => config
                        .ignored_responses
                        .push((method.clone(), slot.clone())),
                    _ => {
                        return Err(CodegenError::config(
                            "ignore-response expects a method name and a response slot",
                        ));
                    }
                },
                "output" => {
                    config.output = Some(PathBuf::from(single_string(node)?));
                }
                other => {
                    return Err(CodegenError::config(format!("unknown config node: {other}")));
                }
            }
        }

        Ok(config)
    }
}

/// Positional string arguments of a node
fn string_args(node: &kdl::KdlNode) -> Result<Vec<String>> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| {
            e.value().as_string().map(str::to_string).ok_or_else(|| {
                CodegenError::config(format!(
                    "{} expects string values",
                    node.name().value()
                ))
            })
        })
        .collect()
}

fn single_string(node: &kdl::KdlNode) -> Result<String> {
    let name = node.name().value();
    let mut args = string_args(node)?;
    match args.len() {
        1 => Ok(args.remove(0)),
        _ => Err(CodegenError::config(format!("{name} expects a single string value"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_filter_patterns() {
        let filter = MethodFilter::parse(["messages.*, users.get", " groups.isMember "]);
        assert!(filter.matches("messages.send"));
        assert!(filter.matches("users.get"));
        assert!(filter.matches("groups.isMember"));
        assert!(!filter.matches("users.search"));
        assert!(!filter.matches("messagesx.send"));

        assert!(MethodFilter::parse(["*"]).matches("anything.at_all"));
        assert!(MethodFilter::parse(Vec::<&str>::new()).matches("users.get"));
        assert!("users.*".parse::<MethodFilter>().expect("filter").matches("users.get"));
    }

    #[test]
    fn test_default_options_ignore_storage_keys() {
        let options = GeneratorOptions::default();
        assert!(options.is_ignored("storage.get", "keysResponse"));
        assert!(!options.is_ignored("storage.get", "response"));
        assert_eq!(options.enum_style, EnumStyle::Union);
    }

    #[test]
    fn test_config_from_kdl() {
        let config = Config::from_kdl(
            r#"
            methods "users.*" "groups.getById"
            enum-style "enum"
            api-version "5.199"
            ignore-response "messages.getHistory" "extendedResponse"
            output "./typings"
            "#,
        )
        .expect("config");

        assert_eq!(config.methods, ["users.*", "groups.getById"]);
        assert_eq!(config.enum_style, Some(EnumStyle::Enum));
        assert_eq!(config.api_version.as_deref(), Some("5.199"));
        assert_eq!(config.output, Some(PathBuf::from("./typings")));

        let options = GeneratorOptions::from_config(&config);
        assert!(options.methods.matches("users.search"));
        assert!(!options.methods.matches("groups.get"));
        assert!(options.is_ignored("messages.getHistory", "extendedResponse"));
        assert!(options.is_ignored("storage.get", "keysResponse"));
    }

    #[test]
    fn test_config_rejects_unknown_nodes() {
        let err = Config::from_kdl("colour \"blue\"").unwrap_err();
        assert!(matches!(err, CodegenError::Config { ref message } if message.contains("colour")));

        assert!(Config::from_kdl("enum-style \"const\"").is_err());
        assert!(Config::from_kdl("ignore-response \"storage.get\"").is_err());
        assert!(Config::from_kdl("api-version 5").is_err());
    }
}
