//! Parser for pip-style requirements manifests.
//!
//! The legacy deployment declares its Python dependencies in a plain-text
//! manifest: one package specifier per line, `#` introduces a comment, and
//! blank lines separate logical groups. Full-line comments immediately before
//! a group act as the group's label; inline comments attach to their entry.
//! The binary parses the manifest at startup (when configured) and logs a
//! migration summary.

use std::fmt;
use thiserror::Error;

/// Errors produced while parsing a manifest
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    /// A non-comment line with no package name (e.g. a bare `==1.0`)
    #[error("invalid specifier on line {line}: {text:?}")]
    InvalidSpecifier {
        /// 1-based line number
        line: usize,
        /// The offending line content
        text: String,
    },
}

/// A single package specifier line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package name as written (up to the first version/extras marker)
    pub name: String,
    /// Exact version when the line pins with `==`
    pub version: Option<String>,
    /// Inline comment text, if any
    pub comment: Option<String>,
}

impl Requirement {
    /// Whether the requirement pins an exact version
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.version.is_some()
    }
}

/// A run of specifier lines delimited by blank lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGroup {
    /// Label taken from the full-line comment preceding the group
    pub label: Option<String>,
    /// The group's requirements, in file order
    pub requirements: Vec<Requirement>,
}

/// A parsed requirements manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Logical dependency groups, in file order
    pub groups: Vec<DependencyGroup>,
}

/// Aggregate counts used for startup logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestSummary {
    /// Number of logical groups
    pub groups: usize,
    /// Number of `==`-pinned requirements
    pub pinned: usize,
    /// Number of unpinned requirements
    pub unpinned: usize,
}

impl fmt::Display for ManifestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} group(s), {} pinned, {} unpinned",
            self.groups, self.pinned, self.unpinned
        )
    }
}

impl Manifest {
    /// Parse manifest text.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::InvalidSpecifier` for a non-comment line that
    /// carries no package name.
    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        let mut groups = Vec::new();
        let mut current = DependencyGroup::default();

        for (idx, raw) in input.lines().enumerate() {
            let line = raw.trim();

            if line.is_empty() {
                if !current.requirements.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                current.label = None;
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                // A comment before any entry labels the group; later comment
                // lines inside a group are ignored.
                if current.requirements.is_empty() {
                    current.label = Some(comment.trim().to_string());
                }
                continue;
            }

            current.requirements.push(parse_specifier(line, idx + 1)?);
        }

        if !current.requirements.is_empty() {
            groups.push(current);
        }

        Ok(Self { groups })
    }

    /// Requirements that pin an exact version
    pub fn pinned(&self) -> impl Iterator<Item = &Requirement> {
        self.groups
            .iter()
            .flat_map(|g| &g.requirements)
            .filter(|r| r.is_pinned())
    }

    /// Requirements without a version pin
    pub fn unpinned(&self) -> impl Iterator<Item = &Requirement> {
        self.groups
            .iter()
            .flat_map(|g| &g.requirements)
            .filter(|r| !r.is_pinned())
    }

    /// Aggregate counts for logging
    #[must_use]
    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            groups: self.groups.len(),
            pinned: self.pinned().count(),
            unpinned: self.unpinned().count(),
        }
    }
}

fn parse_specifier(line: &str, line_no: usize) -> Result<Requirement, ManifestError> {
    let (spec, comment) = split_inline_comment(line);

    let name: String = spec
        .chars()
        .take_while(|c| !matches!(c, '=' | '<' | '>' | '~' | '!' | ';' | '[') && !c.is_whitespace())
        .collect();

    if name.is_empty() {
        return Err(ManifestError::InvalidSpecifier {
            line: line_no,
            text: line.to_string(),
        });
    }

    let version = spec.split_once("==").map(|(_, v)| {
        v.trim()
            .split(|c: char| c == ';' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_string()
    });

    Ok(Requirement {
        name,
        version,
        comment,
    })
}

/// Split off an inline comment. Per pip's format the `#` must be preceded by
/// whitespace to count as a comment.
fn split_inline_comment(line: &str) -> (&str, Option<String>) {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            let comment = line[i + 1..].trim().to_string();
            return (line[..i].trim_end(), Some(comment));
        }
    }
    (line, None)
}
