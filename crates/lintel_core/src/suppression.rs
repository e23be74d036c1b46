//! Suppression markers in source comments.
//!
//! Three forms are understood, the keywords `noqa` and `suppress` being
//! interchangeable and case-insensitive:
//!
//! - inline, on the line of the finding: `# noqa`, `# noqa: E111,W2`
//! - block, as a pair of comment lines: `# noqa-on: E1` ... `# noqa-off`
//! - whole file: `# lintel: noqa` or `# noqa-file` on a comment-only line

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::Violation;

const CODE_LIST: &str = r"(?P<codes>[A-Z]+[0-9]*(?:[,\s]+[A-Z]+[0-9]*)*)";

static MARKER: OnceLock<Regex> = OnceLock::new();
static FILE_MARKER: OnceLock<Regex> = OnceLock::new();
static CODE_SEPARATOR: OnceLock<Regex> = OnceLock::new();

fn marker() -> &'static Regex {
    MARKER.get_or_init(|| {
        let pattern = format!(
            r"#\s*(?i:noqa|suppress)(?:-(?P<kind>(?i:on|off|file)))?\b(?::\s?{CODE_LIST})?"
        );
        Regex::new(&pattern).expect("Invalid suppression marker pattern")
    })
}

fn file_marker() -> &'static Regex {
    FILE_MARKER.get_or_init(|| {
        let pattern = format!(r"^\s*#\s*(?i:lintel)[:=]\s*(?i:noqa)\b(?::\s?{CODE_LIST})?");
        Regex::new(&pattern).expect("Invalid file marker pattern")
    })
}

fn parse_codes(captures: &Captures<'_>) -> Option<Vec<String>> {
    let codes = captures.name("codes")?;
    let separator =
        CODE_SEPARATOR.get_or_init(|| Regex::new(r"[,\s]+").expect("Invalid separator pattern"));
    Some(
        separator
            .split(codes.as_str())
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Returns true when `code` is covered by `codes`; `None` covers every code.
fn covers(codes: Option<&[String]>, code: &str) -> bool {
    codes.is_none_or(|codes| codes.iter().any(|listed| code.starts_with(listed.as_str())))
}

/// A half-open range of lines `[start, end)` covered by a block marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRange {
    /// First covered line (1-indexed), the line of the `on` marker.
    pub start: usize,
    /// First line no longer covered, the line of the `off` marker.
    /// `usize::MAX` for a block that is never closed.
    pub end: usize,
    /// Codes the block applies to; `None` for every code.
    pub codes: Option<Vec<String>>,
}

impl BlockRange {
    pub fn contains(&self, line: usize) -> bool {
        (self.start..self.end).contains(&line)
    }

    /// Returns true when the block suppresses `code` on `line`.
    pub fn suppresses(&self, line: usize, code: &str) -> bool {
        self.contains(line) && covers(self.codes.as_deref(), code)
    }
}

/// Returns true when `lines` contain a whole-file opt-out marker.
///
/// A marker that carries a code list is not a whole-file skip; it is
/// reported and otherwise ignored.
pub fn is_file_suppressed(lines: &[String]) -> bool {
    for line in lines {
        if let Some(captures) = file_marker().captures(line) {
            if captures.name("codes").is_some() {
                warn!(
                    "Detected `lintel: noqa` with codes on line {:?}. This form does not skip the file; use `# noqa: <codes>` on the offending lines instead.",
                    line.trim_end()
                );
                continue;
            }
            return true;
        }

        let comment_only = line.trim_start().starts_with('#');
        if comment_only
            && marker()
                .captures_iter(line)
                .any(|captures| is_kind(&captures, "file") && captures.name("codes").is_none())
        {
            return true;
        }
    }
    false
}

fn is_kind(captures: &Captures<'_>, kind: &str) -> bool {
    captures
        .name("kind")
        .is_some_and(|found| found.as_str().eq_ignore_ascii_case(kind))
}

/// Decides whether a violation is silenced by a marker comment.
///
/// Block ranges are scanned once per file and cached by filename.
#[derive(Debug, Default)]
pub struct SuppressionEvaluator {
    disabled: bool,
    blocks: Mutex<HashMap<String, Arc<Vec<BlockRange>>>>,
}

impl SuppressionEvaluator {
    /// Creates an evaluator. With `disabled` set, nothing is ever suppressed.
    pub fn new(disabled: bool) -> Self {
        Self {
            disabled,
            blocks: Mutex::new(HashMap::new()),
        }
    }

    /// Scans `lines` for `on`/`off` marker pairs.
    ///
    /// An `on` while a block is already open closes the open block and
    /// starts a new one. An `off` without an open block is ignored.
    pub fn scan_blocks(lines: &[String]) -> Vec<BlockRange> {
        let mut ranges = Vec::new();
        let mut open: Option<(usize, Option<Vec<String>>)> = None;

        for (index, line) in lines.iter().enumerate() {
            let line_number = index + 1;
            for captures in marker().captures_iter(line) {
                if is_kind(&captures, "on") {
                    if let Some((start, codes)) = open.take() {
                        ranges.push(BlockRange {
                            start,
                            end: line_number,
                            codes,
                        });
                    }
                    open = Some((line_number, parse_codes(&captures)));
                } else if is_kind(&captures, "off")
                    && let Some((start, codes)) = open.take()
                {
                    ranges.push(BlockRange {
                        start,
                        end: line_number,
                        codes,
                    });
                }
            }
        }

        if let Some((start, codes)) = open {
            ranges.push(BlockRange {
                start,
                end: usize::MAX,
                codes,
            });
        }
        ranges
    }

    /// Stores already scanned block ranges for `filename`, so the file is
    /// not read again. Used for input that cannot be re-read, such as stdin.
    pub fn prime(&self, filename: &str, ranges: Vec<BlockRange>) {
        self.blocks
            .lock()
            .insert(filename.to_string(), Arc::new(ranges));
    }

    fn blocks_for(&self, filename: &str) -> Arc<Vec<BlockRange>> {
        let mut blocks = self.blocks.lock();
        if let Some(ranges) = blocks.get(filename) {
            return Arc::clone(ranges);
        }

        let ranges = match fs::read_to_string(filename) {
            Ok(content) => {
                let lines: Vec<String> = content.lines().map(str::to_string).collect();
                Self::scan_blocks(&lines)
            }
            Err(e) => {
                debug!("Cannot read {} for block markers: {}", filename, e);
                Vec::new()
            }
        };
        let ranges = Arc::new(ranges);
        blocks.insert(filename.to_string(), Arc::clone(&ranges));
        ranges
    }

    /// Returns true when the physical line of `violation` carries an inline
    /// marker covering its code.
    pub fn is_inline_suppressed(&self, violation: &Violation) -> bool {
        if self.disabled {
            return false;
        }
        let Some(physical_line) = violation.physical_line.as_deref() else {
            return false;
        };

        marker()
            .captures_iter(physical_line)
            .filter(|captures| captures.name("kind").is_none())
            .any(|captures| {
                let codes = parse_codes(&captures);
                let suppressed = covers(codes.as_deref(), &violation.code);
                if suppressed {
                    debug!(
                        "{} on line {} of {} is suppressed inline",
                        violation.code, violation.line, violation.filename
                    );
                }
                suppressed
            })
    }

    /// Returns true when `violation` falls inside a block covering its code.
    pub fn is_block_suppressed(&self, violation: &Violation) -> bool {
        if self.disabled {
            return false;
        }
        self.blocks_for(&violation.filename)
            .iter()
            .any(|range| range.suppresses(violation.line, &violation.code))
    }

    /// Returns true when `violation` is silenced by any marker.
    pub fn is_suppressed(&self, violation: &Violation) -> bool {
        self.is_inline_suppressed(violation) || self.is_block_suppressed(violation)
    }
}
