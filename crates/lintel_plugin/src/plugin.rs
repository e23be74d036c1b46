//! Plugin definitions and the immutable plugin set.

use std::collections::HashSet;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::debug;

use crate::{Check, CheckArgs, CheckOutput, Parameter, PluginError};

/// How the file checker invokes a plugin.
///
/// Computed once when the plugin is built, from its declared parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Tree,
    LogicalLine,
    PhysicalLine,
}

impl PluginKind {
    fn from_parameters(parameters: &[Parameter]) -> Option<Self> {
        if parameters.contains(&Parameter::Tree) {
            Some(PluginKind::Tree)
        } else if parameters.contains(&Parameter::LogicalLine) {
            Some(PluginKind::LogicalLine)
        } else if parameters.contains(&Parameter::PhysicalLine) {
            Some(PluginKind::PhysicalLine)
        } else {
            None
        }
    }
}

/// A loaded check plugin.
#[derive(Clone)]
pub struct Plugin {
    id: String,
    package: String,
    version: String,
    kind: PluginKind,
    parameters: Vec<String>,
    declared: Vec<Parameter>,
    unknown: Vec<String>,
    off_by_default: bool,
    check: Arc<dyn Check>,
}

impl Plugin {
    /// Starts building a plugin reporting codes under `id`.
    pub fn builder(id: impl Into<String>, check: impl Check + 'static) -> PluginBuilder {
        PluginBuilder {
            id: id.into(),
            package: "local".to_string(),
            version: "0.0.0".to_string(),
            parameters: Vec::new(),
            off_by_default: false,
            check: Arc::new(check),
        }
    }

    /// The code prefix this plugin reports, e.g. `"E"` or `"C90"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    /// The parameter names exactly as declared.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn off_by_default(&self) -> bool {
        self.off_by_default
    }

    /// A name identifying the plugin in error messages: `package[id]`.
    pub fn display_name(&self) -> String {
        format!("{}[{}]", self.package, self.id)
    }

    /// Returns the declared parameters the checker can supply.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnknownParameters`] if any declared name is
    /// not a known [`Parameter`].
    pub fn declared(&self) -> Result<&[Parameter], PluginError> {
        if self.unknown.is_empty() {
            Ok(&self.declared)
        } else {
            Err(PluginError::UnknownParameters(self.unknown.clone()))
        }
    }

    /// Runs the check, converting a panic into [`PluginError::Panicked`].
    pub fn run(&self, args: &CheckArgs<'_>) -> Result<Vec<CheckOutput>, PluginError> {
        match catch_unwind(AssertUnwindSafe(|| self.check.run(args))) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(PluginError::Panicked(message))
            }
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("package", &self.package)
            .field("version", &self.version)
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .field("off_by_default", &self.off_by_default)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Plugin`].
pub struct PluginBuilder {
    id: String,
    package: String,
    version: String,
    parameters: Vec<String>,
    off_by_default: bool,
    check: Arc<dyn Check>,
}

impl PluginBuilder {
    /// Sets the owning package name.
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Sets the owning package version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the declared parameter names.
    pub fn parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the plugin as requiring explicit opt-in.
    pub fn off_by_default(mut self, off_by_default: bool) -> Self {
        self.off_by_default = off_by_default;
        self
    }

    /// Validates the definition and computes the plugin kind.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidPlugin`] if the id is not a valid code
    /// prefix (one to three uppercase letters followed by up to three
    /// digits), or if none of `tree`, `logical_line` and `physical_line`
    /// is declared.
    pub fn build(self) -> Result<Plugin, PluginError> {
        if !is_valid_code_prefix(&self.id) {
            return Err(PluginError::invalid_plugin(format!(
                "plugin code '{}' must match [A-Z]{{1,3}}[0-9]{{0,3}}",
                self.id
            )));
        }

        let mut declared = Vec::new();
        let mut unknown = Vec::new();
        for name in &self.parameters {
            match name.parse::<Parameter>() {
                Ok(parameter) => declared.push(parameter),
                Err(name) => unknown.push(name),
            }
        }

        let kind = PluginKind::from_parameters(&declared).ok_or_else(|| {
            PluginError::invalid_plugin(format!(
                "plugin '{}' must declare tree, logical_line or physical_line",
                self.id
            ))
        })?;

        Ok(Plugin {
            id: self.id,
            package: self.package,
            version: self.version,
            kind,
            parameters: self.parameters,
            declared,
            unknown,
            off_by_default: self.off_by_default,
            check: self.check,
        })
    }
}

fn is_valid_code_prefix(id: &str) -> bool {
    let letters = id.chars().take_while(char::is_ascii_uppercase).count();
    let digits = id[letters..].chars().take_while(char::is_ascii_digit).count();
    (1..=3).contains(&letters) && digits <= 3 && letters + digits == id.len()
}

/// Plugins grouped by how the file checker invokes them.
#[derive(Debug, Clone, Default)]
pub struct Checkers {
    pub tree: Vec<Plugin>,
    pub logical_line: Vec<Plugin>,
    pub physical_line: Vec<Plugin>,
}

impl Checkers {
    /// Iterates over every plugin, tree plugins first.
    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.tree
            .iter()
            .chain(&self.logical_line)
            .chain(&self.physical_line)
    }
}

/// The explicit, immutable set of loaded plugins.
#[derive(Debug, Clone, Default)]
pub struct PluginSet {
    plugins: Vec<Plugin>,
}

impl PluginSet {
    /// Creates a plugin set.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidPlugin`] if two plugins share an id.
    pub fn new(plugins: Vec<Plugin>) -> Result<Self, PluginError> {
        let mut seen = HashSet::new();
        for plugin in &plugins {
            if !seen.insert(plugin.id()) {
                return Err(PluginError::invalid_plugin(format!(
                    "duplicate plugin code '{}'",
                    plugin.id()
                )));
            }
        }
        debug!("Loaded {} plugins", plugins.len());
        Ok(Self { plugins })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plugin> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Looks up a plugin by id.
    pub fn get(&self, id: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|plugin| plugin.id() == id)
    }

    fn is_enabled(plugin: &Plugin, enable_extensions: &[String]) -> bool {
        !plugin.off_by_default() || enable_extensions.iter().any(|id| id == plugin.id())
    }

    /// Groups the enabled plugins by kind.
    ///
    /// Off-by-default plugins are kept only when `enable_extensions` names
    /// their id.
    pub fn classify(&self, enable_extensions: &[String]) -> Checkers {
        let mut checkers = Checkers::default();
        for plugin in self
            .plugins
            .iter()
            .filter(|plugin| Self::is_enabled(plugin, enable_extensions))
        {
            let bucket = match plugin.kind() {
                PluginKind::Tree => &mut checkers.tree,
                PluginKind::LogicalLine => &mut checkers.logical_line,
                PluginKind::PhysicalLine => &mut checkers.physical_line,
            };
            bucket.push(plugin.clone());
        }
        checkers
    }

    /// Returns the soft default-select set: the ids of enabled plugins.
    pub fn default_select(&self, enable_extensions: &[String]) -> Vec<String> {
        self.plugins
            .iter()
            .filter(|plugin| Self::is_enabled(plugin, enable_extensions))
            .map(|plugin| plugin.id().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check_fn;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn noop(id: &str, parameters: &[&str]) -> PluginBuilder {
        Plugin::builder(id, check_fn(|_| Ok(Vec::new()))).parameters(parameters.iter().copied())
    }

    #[rstest]
    #[case::tree_wins(&["tree", "logical_line", "physical_line"], PluginKind::Tree)]
    #[case::logical_over_physical(&["physical_line", "logical_line"], PluginKind::LogicalLine)]
    #[case::physical(&["physical_line", "line_number"], PluginKind::PhysicalLine)]
    fn test_kind_from_parameters(#[case] parameters: &[&str], #[case] expected: PluginKind) {
        let plugin = noop("E", parameters).build().unwrap();
        assert_eq!(plugin.kind(), expected);
    }

    #[test]
    fn test_missing_capability_is_load_error() {
        let err = noop("E", &["filename"]).build().unwrap_err();
        assert!(matches!(err, PluginError::InvalidPlugin(_)));
    }

    #[rstest]
    #[case("E", true)]
    #[case("C90", true)]
    #[case("ABC123", true)]
    #[case("ABCD", false)]
    #[case("E1234", false)]
    #[case("e1", false)]
    #[case("", false)]
    #[case("1E", false)]
    fn test_code_prefix_validation(#[case] id: &str, #[case] valid: bool) {
        assert_eq!(noop(id, &["tree"]).build().is_ok(), valid);
    }

    #[test]
    fn test_unknown_parameters_surface_on_use() {
        let plugin = noop("X", &["logical_line", "colour"]).build().unwrap();
        assert_eq!(
            plugin.declared().unwrap_err(),
            PluginError::UnknownParameters(vec!["colour".to_string()])
        );
    }

    #[test]
    fn test_panic_becomes_error() {
        let plugin = Plugin::builder("P", check_fn(|_| panic!("kaboom")))
            .parameters(["tree"])
            .build()
            .unwrap();
        let args = CheckArgs::new(Default::default(), &[]);
        assert_eq!(
            plugin.run(&args).unwrap_err(),
            PluginError::Panicked("kaboom".to_string())
        );
    }

    #[test]
    fn test_classify_and_default_select() {
        let plugins = PluginSet::new(vec![
            noop("E", &["logical_line"]).build().unwrap(),
            noop("W", &["physical_line"]).build().unwrap(),
            noop("C90", &["tree"]).build().unwrap(),
            noop("T10", &["physical_line"])
                .off_by_default(true)
                .build()
                .unwrap(),
        ])
        .unwrap();

        let checkers = plugins.classify(&[]);
        assert_eq!(checkers.tree.len(), 1);
        assert_eq!(checkers.logical_line.len(), 1);
        assert_eq!(checkers.physical_line.len(), 1);
        assert_eq!(plugins.default_select(&[]), vec!["E", "W", "C90"]);

        let enabled = vec!["T10".to_string()];
        assert_eq!(plugins.classify(&enabled).physical_line.len(), 2);
        assert_eq!(plugins.default_select(&enabled), vec!["E", "W", "C90", "T10"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = PluginSet::new(vec![
            noop("E", &["tree"]).build().unwrap(),
            noop("E", &["tree"]).build().unwrap(),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_display_name() {
        let plugin = noop("E", &["tree"])
            .package("lintel_rules")
            .version("0.1.0")
            .build()
            .unwrap();
        assert_eq!(plugin.display_name(), "lintel_rules[E]");
        assert_eq!(plugin.version(), "0.1.0");
    }
}
