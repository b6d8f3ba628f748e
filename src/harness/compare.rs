//! Output comparison
//!
//! The verdict is decided on bytes. The line diff is only computed after a
//! mismatch, to tell the reader where the outputs diverge.

use serde::Serialize;

use super::Outcome;

/// Above this many table cells the diff falls back to a positional
/// comparison instead of a longest-common-subsequence walk
const LCS_CELL_LIMIT: usize = 4_000_000;

/// How line terminators at the very end of the output are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlinePolicy {
    /// Trailing `\n` / `\r\n` are ignored on both sides
    #[default]
    Tolerant,
    /// Bytes must match exactly
    Exact,
}

impl NewlinePolicy {
    fn normalize<'a>(&self, mut bytes: &'a [u8]) -> &'a [u8] {
        if *self == NewlinePolicy::Exact {
            return bytes;
        }
        while let Some(rest) = bytes.strip_suffix(b"\n") {
            bytes = rest.strip_suffix(b"\r").unwrap_or(rest);
        }
        bytes
    }
}

/// Which side a diff line comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffSide {
    /// Present in the expected output only
    Expected,
    /// Present in the actual output only
    Actual,
}

/// A single differing line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub side: DiffSide,
    /// 1-based line number within its own side
    pub line: usize,
    pub text: String,
}

/// Line-oriented summary of a mismatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiff {
    /// 1-based line where the outputs first diverge
    pub first_divergence: usize,
    /// Differing lines, expected before actual within each hunk
    pub lines: Vec<DiffLine>,
    /// Differing lines not shown because of the display limit
    pub omitted: usize,
    /// Set when no line differs as text (line terminators, invalid UTF-8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Decides Pass/Fail for one fixture
#[derive(Debug, Clone)]
pub struct OutputComparator {
    newline: NewlinePolicy,
    max_diff_lines: usize,
}

impl Default for OutputComparator {
    fn default() -> Self {
        Self::new(NewlinePolicy::default(), 20)
    }
}

impl OutputComparator {
    pub fn new(newline: NewlinePolicy, max_diff_lines: usize) -> Self {
        Self {
            newline,
            max_diff_lines,
        }
    }

    /// Compare expected and actual stdout
    pub fn compare(&self, expected: &[u8], actual: &[u8]) -> Outcome {
        let expected = self.newline.normalize(expected);
        let actual = self.newline.normalize(actual);

        if expected == actual {
            return Outcome::Pass;
        }

        Outcome::Fail(line_diff(
            &String::from_utf8_lossy(expected),
            &String::from_utf8_lossy(actual),
            self.max_diff_lines,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Remove(usize),
    Insert(usize),
}

/// Build a bounded line diff between two texts
pub fn line_diff(expected: &str, actual: &str, max_lines: usize) -> LineDiff {
    let exp: Vec<&str> = expected.lines().collect();
    let act: Vec<&str> = actual.lines().collect();

    let prefix = exp.iter().zip(&act).take_while(|(e, a)| e == a).count();
    let suffix = exp[prefix..]
        .iter()
        .rev()
        .zip(act[prefix..].iter().rev())
        .take_while(|(e, a)| e == a)
        .count();
    let exp_mid = &exp[prefix..exp.len() - suffix];
    let act_mid = &act[prefix..act.len() - suffix];

    let edits = if exp_mid.len().saturating_mul(act_mid.len()) <= LCS_CELL_LIMIT {
        lcs_edits(exp_mid, act_mid)
    } else {
        positional_edits(exp_mid, act_mid)
    };

    let note = edits
        .is_empty()
        .then(|| "no line differs as text; line terminators or non UTF-8 bytes differ".to_string());

    let lines = edits
        .iter()
        .take(max_lines)
        .map(|edit| match *edit {
            Edit::Remove(i) => DiffLine {
                side: DiffSide::Expected,
                line: prefix + i + 1,
                text: exp_mid[i].to_string(),
            },
            Edit::Insert(j) => DiffLine {
                side: DiffSide::Actual,
                line: prefix + j + 1,
                text: act_mid[j].to_string(),
            },
        })
        .collect();

    LineDiff {
        first_divergence: prefix + 1,
        lines,
        omitted: edits.len().saturating_sub(max_lines),
        note,
    }
}

/// Minimal edit script via a longest-common-subsequence table.
///
/// `table[i][j]` holds the LCS length of `exp[i..]` and `act[j..]`.
fn lcs_edits(exp: &[&str], act: &[&str]) -> Vec<Edit> {
    let (n, m) = (exp.len(), act.len());
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if exp[i] == act[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut edits = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if exp[i] == act[j] {
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            edits.push(Edit::Remove(i));
            i += 1;
        } else {
            edits.push(Edit::Insert(j));
            j += 1;
        }
    }
    edits.extend((i..n).map(Edit::Remove));
    edits.extend((j..m).map(Edit::Insert));
    edits
}

/// Line-by-line comparison for inputs too large for the LCS table
fn positional_edits(exp: &[&str], act: &[&str]) -> Vec<Edit> {
    let mut edits = Vec::new();
    for k in 0..exp.len().max(act.len()) {
        match (exp.get(k), act.get(k)) {
            (Some(e), Some(a)) if e == a => {}
            (e, a) => {
                if e.is_some() {
                    edits.push(Edit::Remove(k));
                }
                if a.is_some() {
                    edits.push(Edit::Insert(k));
                }
            }
        }
    }
    edits
}
