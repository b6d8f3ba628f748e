//! Fixture discovery
//!
//! A fixture is a pair of sibling files `<id><input-suffix>` and
//! `<id><output-suffix>`. Inputs without an output are skipped with a
//! warning so that half-written suites stay runnable.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Naming convention pairing inputs with expected outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureNaming {
    pub input_suffix: String,
    pub output_suffix: String,
}

impl Default for FixtureNaming {
    fn default() -> Self {
        Self {
            input_suffix: ".input".to_string(),
            output_suffix: ".output".to_string(),
        }
    }
}

impl FixtureNaming {
    pub fn new(input_suffix: impl Into<String>, output_suffix: impl Into<String>) -> Self {
        Self {
            input_suffix: input_suffix.into(),
            output_suffix: output_suffix.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.input_suffix.is_empty() || self.output_suffix.is_empty() {
            return Err(Error::InvalidNaming(
                "input and output suffixes must not be empty".to_string(),
            ));
        }
        if self.input_suffix == self.output_suffix {
            return Err(Error::InvalidNaming(format!(
                "input and output suffixes are both '{}'",
                self.input_suffix
            )));
        }
        Ok(())
    }

    /// Name of the expected-output file for an identifier
    pub fn output_name(&self, id: &str) -> String {
        format!("{}{}", id, self.output_suffix)
    }
}

/// One discovered test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePair {
    /// Input file name with the input suffix stripped
    pub id: String,
    pub input: PathBuf,
    pub expected: PathBuf,
}

impl FixturePair {
    /// Read the bytes fed to the target's stdin
    pub fn read_input(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.input)
    }

    /// Read the expected stdout bytes
    pub fn read_expected(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.expected)
    }
}

/// Recoverable problems found during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// An input file with no expected-output sibling
    MissingExpected { id: String, expected: PathBuf },
    /// A directory entry whose name is not valid UTF-8
    NonUtf8Name { path: PathBuf },
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingExpected { id, expected } => write!(
                f,
                "{}: no expected output '{}', skipping",
                id,
                expected.display()
            ),
            Self::NonUtf8Name { path } => {
                write!(f, "ignoring non UTF-8 file name '{}'", path.display())
            }
        }
    }
}

/// The result of a discovery pass: sorted pairs plus warnings
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    pairs: Vec<FixturePair>,
    warnings: Vec<DiscoveryWarning>,
}

impl FixtureSet {
    /// Fixtures in identifier order. Can be called any number of times.
    pub fn iter(&self) -> std::slice::Iter<'_, FixturePair> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no fixture was found, which callers must treat
    /// differently from "every fixture passed"
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn warnings(&self) -> &[DiscoveryWarning] {
        &self.warnings
    }
}

impl<'a> IntoIterator for &'a FixtureSet {
    type Item = &'a FixturePair;
    type IntoIter = std::slice::Iter<'a, FixturePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Finds fixture pairs in a single directory (not recursive)
#[derive(Debug, Clone)]
pub struct FixtureLocator {
    dir: PathBuf,
    naming: FixtureNaming,
    filter: Option<String>,
}

impl FixtureLocator {
    pub fn new(dir: impl Into<PathBuf>, naming: FixtureNaming) -> Self {
        Self {
            dir: dir.into(),
            naming,
            filter: None,
        }
    }

    /// Only keep fixtures whose identifier contains `pattern`
    pub fn with_filter(mut self, pattern: Option<String>) -> Self {
        self.filter = pattern.filter(|p| !p.is_empty());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scan the directory
    ///
    /// Only an unreadable directory or an invalid naming convention is an
    /// error; everything else is a warning on the returned set.
    pub fn discover(&self) -> Result<FixtureSet> {
        self.naming.validate()?;

        let entries = std::fs::read_dir(&self.dir).map_err(|e| Error::fixture_dir(&self.dir, e))?;

        // name -> is regular file
        let mut files = BTreeMap::new();
        let mut warnings = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| Error::fixture_dir(&self.dir, e))?;
            let path = entry.path();
            let Ok(name) = entry.file_name().into_string() else {
                warnings.push(DiscoveryWarning::NonUtf8Name { path });
                continue;
            };
            // Follow symlinks so linked fixtures count as files
            let is_file = std::fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
            files.insert(name, is_file);
        }

        let mut pairs = Vec::new();
        for (name, is_file) in &files {
            if !is_file {
                continue;
            }
            let Some(id) = name.strip_suffix(self.naming.input_suffix.as_str()) else {
                continue;
            };
            if id.is_empty() {
                continue;
            }
            if let Some(pattern) = &self.filter {
                if !id.contains(pattern.as_str()) {
                    continue;
                }
            }

            let output_name = self.naming.output_name(id);
            let expected = self.dir.join(&output_name);
            if files.get(&output_name).copied() != Some(true) {
                tracing::debug!("Fixture {} has no {}", id, output_name);
                warnings.push(DiscoveryWarning::MissingExpected {
                    id: id.to_string(),
                    expected,
                });
                continue;
            }

            pairs.push(FixturePair {
                id: id.to_string(),
                input: self.dir.join(name),
                expected,
            });
        }

        // "a-b.input" sorts before "a.input", but "a" comes before "a-b"
        pairs.sort_by(|a, b| a.id.cmp(&b.id));
        warnings.sort_by(|a, b| warning_key(a).cmp(warning_key(b)));

        tracing::debug!(
            "Discovered {} fixture(s) in {} ({} warning(s))",
            pairs.len(),
            self.dir.display(),
            warnings.len()
        );

        Ok(FixtureSet { pairs, warnings })
    }
}

fn warning_key(warning: &DiscoveryWarning) -> &Path {
    match warning {
        DiscoveryWarning::MissingExpected { expected, .. } => expected,
        DiscoveryWarning::NonUtf8Name { path } => path,
    }
}
