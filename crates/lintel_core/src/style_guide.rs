//! Routing of findings through the decision engine, suppression markers,
//! statistics and listeners to the result sink.

use std::path::Path;
use std::sync::Arc;

use lintel_plugin::PluginSet;
use tracing::debug;

use crate::checker::{E902, E999};
use crate::decision::{Decision, DecisionEngine};
use crate::discovery::{FilenameMatcher, normalize_patterns};
use crate::statistics::Statistics;
use crate::suppression::{BlockRange, SuppressionEvaluator};
use crate::trie::{Listener, Notifier};
use crate::{LintelError, RunOptions, Violation};

/// Receives every reported violation.
pub trait ResultSink {
    fn handle(&mut self, violation: &Violation);

    /// Called once a file's findings have all been handled.
    fn file_finished(&mut self, _filename: &str) {}
}

impl ResultSink for Vec<Violation> {
    fn handle(&mut self, violation: &Violation) {
        self.push(violation.clone());
    }
}

/// Select/ignore settings for a set of files.
#[derive(Debug)]
pub struct StyleGuide {
    pattern: Option<String>,
    matcher: FilenameMatcher,
    decider: DecisionEngine,
}

impl StyleGuide {
    /// The guide used for files no per-file pattern matches.
    pub fn new(options: &RunOptions, default_select: &[String]) -> Self {
        Self {
            pattern: None,
            matcher: FilenameMatcher::default(),
            decider: DecisionEngine::new(options, default_select),
        }
    }

    /// A guide for files matching `pattern` that also ignores `codes`.
    pub fn for_pattern(
        pattern: &str,
        codes: &[String],
        options: &RunOptions,
        default_select: &[String],
    ) -> Result<Self, LintelError> {
        let mut options = options.clone();
        options.extend_ignore.extend(codes.iter().cloned());

        let pattern = normalize_patterns(&[pattern.to_string()]).remove(0);
        Ok(Self {
            matcher: FilenameMatcher::new(std::slice::from_ref(&pattern))?,
            pattern: Some(pattern),
            decider: DecisionEngine::new(&options, default_select),
        })
    }

    /// The normalized per-file pattern, `None` for the default guide.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn applies_to(&self, filename: &str) -> bool {
        self.pattern.is_none() || self.matcher.matches(Path::new(filename))
    }

    pub fn decision_for(&self, code: &str) -> Decision {
        self.decider.decision_for(code)
    }
}

/// Owns the style guides and everything shared between them.
pub struct StyleGuideManager<S: ResultSink = Vec<Violation>> {
    default: StyleGuide,
    per_file: Vec<StyleGuide>,
    suppression: SuppressionEvaluator,
    statistics: Statistics,
    notifier: Notifier,
    sink: S,
}

impl<S: ResultSink> StyleGuideManager<S> {
    /// Builds the default guide plus one guide per per-file ignore entry.
    ///
    /// The codes of enabled plugins and the synthetic I/O and syntax error
    /// codes are selected by default.
    pub fn new(options: &RunOptions, plugins: &PluginSet, sink: S) -> Result<Self, LintelError> {
        let mut default_select = plugins.default_select(&options.enable_extensions);
        default_select.extend([E902.to_string(), E999.to_string()]);
        let per_file = options
            .per_file_ignores
            .iter()
            .map(|(pattern, codes)| StyleGuide::for_pattern(pattern, codes, options, &default_select))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            default: StyleGuide::new(options, &default_select),
            per_file,
            suppression: SuppressionEvaluator::new(options.disable_noqa),
            statistics: Statistics::new(),
            notifier: Notifier::new(),
            sink,
        })
    }

    /// Returns the guide for `filename`: the matching per-file guide with
    /// the longest pattern, else the default guide.
    pub fn style_guide_for(&self, filename: &str) -> &StyleGuide {
        self.per_file
            .iter()
            .filter(|guide| guide.applies_to(filename))
            .max_by_key(|guide| guide.pattern().map_or(0, str::len))
            .unwrap_or(&self.default)
    }

    /// Reports one finding. `column` is 0-indexed.
    ///
    /// Returns 1 when the finding was selected and not suppressed, else 0.
    pub fn handle_error(
        &mut self,
        code: &str,
        filename: &str,
        line: usize,
        column: usize,
        text: &str,
        physical_line: Option<String>,
    ) -> usize {
        let violation =
            Violation::new(code, filename, line, column + 1, text).with_physical_line(physical_line);

        let decision = self.style_guide_for(filename).decision_for(code);
        if decision != Decision::Selected || self.suppression.is_suppressed(&violation) {
            return 0;
        }

        self.sink.handle(&violation);
        self.statistics.record(&violation);
        self.notifier.notify(code, &violation);
        1
    }

    /// Hands a file's block ranges to the suppression evaluator so it does
    /// not need to read the file again.
    pub fn prime_suppressions(&self, filename: &str, ranges: Vec<BlockRange>) {
        self.suppression.prime(filename, ranges);
    }

    pub fn file_finished(&mut self, filename: &str) {
        debug!("Finished reporting {}", filename);
        self.sink.file_finished(filename);
    }

    /// Calls `listener` for every reported code starting with `code_prefix`.
    pub fn register_listener(&mut self, code_prefix: &str, listener: Arc<dyn Listener>) {
        self.notifier.register_listener(code_prefix, listener);
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
