//! Flattening of `mvn dependency:tree` output.
//!
//! The listing looks like:
//!
//! ```text
//! com.acme:app:jar:1.0.0
//! +- com.acme:lib-a:jar:1.0.0:compile
//! |  \- org.slf4j:slf4j-api:jar:1.7.36:compile
//! \- junit:junit:jar:4.13.2:test
//! ```
//!
//! The first line names the project itself and is skipped. Every other
//! entry sits behind a drawing prefix three columns wide per level.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use facade_config::config::Mediation;
use facade_util::maven::MavenCoordinate;

use crate::error::EngineError;

/// Width of one level of tree indentation.
const LEVEL_WIDTH: usize = 3;

fn is_drawing_char(c: char) -> bool {
    matches!(c, ' ' | '|' | '+' | '-' | '\\' | '│' | '├' | '└' | '─')
}

/// One entry of the tree with its nesting depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// 0 for top-level lines, 1 for their children, and so on.
    pub depth: usize,
    pub coordinate: MavenCoordinate,
}

/// Parse every dependency line of the listing, in document order.
///
/// Blank lines and the project's own header line are skipped.
///
/// # Errors
/// Returns `EngineError::Parse` with the 1-based line number for any line
/// that is not a well-formed tree entry.
pub fn parse_tree_entries(text: &str) -> Result<Vec<TreeEntry>, EngineError> {
    let mut entries = Vec::new();
    let mut seen_content = false;

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        let (width, rest) = split_prefix(line);
        // Annotations such as "(optional)" or "(version managed from 1.0)" follow the coordinate.
        let entry = rest.split_whitespace().next().unwrap_or_default();

        let is_header = !seen_content && width == 0 && entry.split(':').count() == 4;
        seen_content = true;
        if is_header {
            continue;
        }

        let coordinate =
            MavenCoordinate::parse_tree_entry(entry).map_err(|e| EngineError::Parse {
                line: idx + 1,
                reason: e.to_string(),
            })?;
        entries.push(TreeEntry {
            depth: width / LEVEL_WIDTH,
            coordinate,
        });
    }

    Ok(entries)
}

/// Flatten the listing into one coordinate per `(groupId, artifactId)`.
///
/// The result is ordered by where each artifact first appears. When an
/// artifact appears more than once, `mediation` decides whose version is kept:
/// [`Mediation::Nearest`] keeps the shallowest occurrence (earlier line on
/// ties), [`Mediation::First`] keeps the earliest line.
///
/// # Errors
/// Returns `EngineError::Parse` if the listing is malformed.
pub fn parse_dependency_tree(
    text: &str,
    mediation: Mediation,
) -> Result<Vec<MavenCoordinate>, EngineError> {
    let entries = parse_tree_entries(text)?;

    // key -> (position in `flat`, depth of the kept occurrence)
    let mut index: HashMap<(String, String), (usize, usize)> = HashMap::new();
    let mut flat: Vec<MavenCoordinate> = Vec::new();

    for TreeEntry { depth, coordinate } in entries {
        let key = (coordinate.group_id.clone(), coordinate.artifact_id.clone());
        match index.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert((flat.len(), depth));
                flat.push(coordinate);
            }
            Entry::Occupied(mut slot) => {
                let (pos, kept_depth) = slot.get_mut();
                if mediation == Mediation::Nearest && depth < *kept_depth {
                    if let Some(kept) = flat.get_mut(*pos) {
                        tracing::debug!(
                            "{}:{} mediated to {} (depth {depth}) over {}",
                            coordinate.group_id,
                            coordinate.artifact_id,
                            coordinate.version,
                            kept.version
                        );
                        *kept = coordinate;
                        *kept_depth = depth;
                    }
                }
            }
        }
    }

    Ok(flat)
}

/// Split a line into the width of its drawing prefix and the remainder.
fn split_prefix(line: &str) -> (usize, &str) {
    let mut width = 0;
    for (byte_idx, c) in line.char_indices() {
        if !is_drawing_char(c) {
            return (width, line.get(byte_idx..).unwrap_or_default());
        }
        width += 1;
    }
    (width, "")
}
