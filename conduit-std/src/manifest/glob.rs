//! Glob expansion for manifest entries.
//!
//! Supported syntax, per path segment separated by `/`:
//!
//! - `*` matches any run of characters within the segment
//! - `?` matches exactly one character
//! - `**` as a whole segment matches zero or more segments

use conduit_core::ManifestError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DOUBLE_STAR: &str = "**";

/// Expand `pattern` relative to `base` into the matching files, sorted.
///
/// A pattern without wildcards names a single file; it matches only if that
/// file exists. A literal prefix that does not exist matches nothing.
pub fn expand(base: &Path, pattern: &str) -> Result<Vec<PathBuf>, ManifestError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(ManifestError::InvalidGlob(pattern.to_owned()));
    }

    let mut root = if pattern.starts_with('/') {
        PathBuf::from("/")
    } else {
        base.to_path_buf()
    };
    let mut segments = pattern.split('/').filter(|s| !s.is_empty() && *s != ".");
    let mut wild: Vec<&str> = Vec::new();
    for segment in segments.by_ref() {
        if has_wildcard(segment) {
            wild.push(segment);
            break;
        }
        root.push(segment);
    }
    wild.extend(segments);

    if wild.is_empty() {
        return Ok(if root.is_file() { vec![root] } else { Vec::new() });
    }
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let max_depth = if wild.contains(&DOUBLE_STAR) {
        usize::MAX
    } else {
        wild.len()
    };

    let mut matches = Vec::new();
    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ManifestError::Walk {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let names: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if matches_path(&wild, &names) {
            matches.push(entry.into_path());
        }
    }
    matches.sort();
    Ok(matches)
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?'])
}

fn matches_path(pattern: &[&str], names: &[String]) -> bool {
    match pattern.split_first() {
        None => names.is_empty(),
        Some((&DOUBLE_STAR, rest)) => {
            (0..=names.len()).any(|skip| matches_path(rest, &names[skip..]))
        }
        Some((segment, rest)) => match names.split_first() {
            Some((name, remaining)) => {
                matches_segment(segment, name) && matches_path(rest, remaining)
            }
            None => false,
        },
    }
}

/// Match one path segment against a pattern with `*` and `?`.
pub fn matches_segment(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some('?') => {
                p += 1;
                n += 1;
            }
            Some(c) if *c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    p = star + 1;
                    n = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}
