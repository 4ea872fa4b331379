//! Slash separated paths relative to a [`Level`].

use crate::level::Level;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Walk `path` one segment at a time starting from `level`.
///
/// `.` and empty segments stay put and `..` moves to the parent (staying at
/// root when already there). Any other segment must name a bucket; the whole
/// walk yields `None` as soon as one does not, so callers never see a
/// half-resolved position.
pub fn resolve<'tx>(level: &Level<'tx>, path: &str) -> Option<Level<'tx>> {
    path.split(SEPARATOR)
        .try_fold(level.clone(), |level, segment| match segment {
            "" | "." => Some(level),
            ".." => Some(level.prev().unwrap_or(level)),
            name => level.cd(name),
        })
}

/// Split `path` at its last separator into a bucket prefix and a key.
///
/// `a/b/key` becomes `(Some("a/b"), "key")`; a bare `key` has no prefix.
pub fn split_key(path: &str) -> (Option<&str>, &str) {
    match path.rsplit_once(SEPARATOR) {
        Some((prefix, key)) => (Some(prefix), key),
        None => (None, path),
    }
}

/// Resolve the bucket part of `path` and return it along with the key.
pub fn resolve_key<'tx, 'p>(level: &Level<'tx>, path: &'p str) -> Option<(Level<'tx>, &'p str)> {
    match split_key(path) {
        (Some(prefix), key) => resolve(level, prefix).map(|target| (target, key)),
        (None, key) => Some((level.clone(), key)),
    }
}
