//! String path algebra.
//!
//! Paths are plain `String`s separated by `/` (and `\` on input) so that
//! locations inside archives, which the OS cannot resolve, use the same
//! representation as real directories. Only [`absolute_path`] and its
//! variants touch the filesystem.

use std::path::Path;

use crate::core::FsError;
use crate::fs::{FileSystem, StdFileSystem};

/// Separator used when building paths.
pub const SEPARATOR: char = '/';

/// Extension (lower-case, dot included) that marks a browsable archive.
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Returns whether `c` separates path segments.
pub fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn is_drive_token(s: &str) -> bool {
    s.len() == 2 && s.ends_with(':') && s.as_bytes()[0].is_ascii_alphabetic()
}

/// Replaces every `\` with `/`.
pub fn unify_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Returns whether the path is rooted (`/x`, `\x` or `C:/x`).
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(is_separator) || path.get(..2).is_some_and(is_drive_token)
}

/// Strips trailing separators, keeping a bare root (`/`) or drive root (`C:/`).
pub fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    if trimmed.len() == path.len() {
        return path;
    }
    if trimmed.is_empty() || is_drive_token(trimmed) {
        &path[..trimmed.len() + 1]
    } else {
        trimmed
    }
}

/// Parent of `path`.
///
/// Trailing separators are ignored. Empty input, a bare separator and a drive
/// token are returned unchanged; a path whose only separator is the leading
/// one yields the root; a path without separators yields `""`.
pub fn directory_name(path: &str) -> String {
    if path.is_empty() || path == "/" || path == "\\" || is_drive_token(path) {
        return path.to_string();
    }
    let trimmed = trim_trailing_separators(path);
    if trimmed.len() != path.len() {
        if trimmed.len() == 1 || is_drive_token(trimmed.trim_end_matches(is_separator)) {
            return trimmed.to_string();
        }
        return directory_name(trimmed);
    }
    match path.rfind(is_separator) {
        Some(0) => path[..1].to_string(),
        Some(i) => path[..i].to_string(),
        None => String::new(),
    }
}

/// Final segment: the substring after the last separator, or the whole input.
pub fn file_name(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Lower-cased extension of the final segment, dot included (`".png"`), or
/// `""` when the final segment has no dot.
pub fn extension(path: &str) -> String {
    let name = file_name(path);
    match name.rfind('.') {
        Some(i) => name[i..].to_lowercase(),
        None => String::new(),
    }
}

/// Joins `dir` and `name` with exactly one separator. An empty `dir` yields
/// `name` as-is.
pub fn combine(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    let name = name.trim_start_matches(is_separator);
    let mut out = String::with_capacity(dir.len() + 1 + name.len());
    out.push_str(dir);
    if !dir.ends_with(is_separator) {
        out.push(SEPARATOR);
    }
    out.push_str(name);
    out
}

/// Appends one breadcrumb segment to `acc`.
///
/// Folding [`split`] output through `append` rebuilds the path without its
/// trailing separator; a bare root or drive stays rooted (`/`, `C:/`).
pub fn append(acc: &mut String, segment: &str) {
    if segment.is_empty() {
        return;
    }
    if !acc.is_empty() && !acc.ends_with(is_separator) {
        acc.push(SEPARATOR);
    }
    acc.push_str(segment);
    let keep = acc.trim_end_matches(is_separator).len();
    acc.truncate(keep);
    if acc.is_empty() || is_drive_token(acc) {
        acc.push(SEPARATOR);
    }
}

/// Splits `path` into breadcrumb segments.
///
/// Both separators are accepted. A leading separator becomes the root segment
/// `"/"` and empty segments are dropped. With `keep_trailing`, every segment
/// except the last keeps a trailing `/`; a lone drive token always does.
pub fn split(path: &str, keep_trailing: bool) -> Vec<String> {
    let mut out = Vec::new();
    if path.starts_with(is_separator) {
        out.push(SEPARATOR.to_string());
    }
    let parts: Vec<&str> = path.split(is_separator).filter(|s| !s.is_empty()).collect();
    let last = parts.len().saturating_sub(1);
    for (i, part) in parts.iter().enumerate() {
        if keep_trailing && i < last {
            out.push(format!("{part}{SEPARATOR}"));
        } else {
            out.push((*part).to_string());
        }
    }
    if out.len() == 1 && is_drive_token(&out[0]) {
        out[0].push(SEPARATOR);
    }
    out
}

/// Label shown for a breadcrumb segment (trailing separator removed, roots
/// kept).
pub fn segment_label(segment: &str) -> &str {
    trim_trailing_separators(segment)
}

/// Returns whether the final segment carries [`ARCHIVE_EXTENSION`]
/// (case-insensitive).
pub fn has_archive_extension(path: &str) -> bool {
    extension(trim_trailing_separators(path)) == ARCHIVE_EXTENSION
}

/// Converts an OS path into the crate's string form.
pub fn from_os_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    if cfg!(windows) {
        let text = text.strip_prefix(r"\\?\").unwrap_or(text.as_ref());
        trim_trailing_separators(&unify_separators(text)).to_string()
    } else {
        text.into_owned()
    }
}

/// Absolute, canonical form of `path` resolved through `fs`.
///
/// Empty input means the current directory.
pub fn absolute_path_with(fs: &dyn FileSystem, path: &str) -> Result<String, FsError> {
    let target = if path.is_empty() { "." } else { path };
    fs.canonicalize(Path::new(target))
        .map(|p| from_os_path(&p))
        .map_err(|source| FsError::PathResolution {
            path: path.to_string(),
            source,
        })
}

/// Absolute, canonical form of `path` resolved by the OS (`.`, `..` and
/// symlinks). Empty input means the current directory.
pub fn absolute_path(path: &str) -> Result<String, FsError> {
    absolute_path_with(&StdFileSystem, path)
}

/// [`absolute_path_with`], falling back to [`normalize`] when the OS cannot
/// resolve the path (for example because it does not exist).
pub fn absolute_path_or_normalized(fs: &dyn FileSystem, path: &str) -> String {
    match absolute_path_with(fs, path) {
        Ok(p) => p,
        Err(_) => normalize(path),
    }
}

/// Lexical normalization: separators unified, `.` and `..` collapsed,
/// relative input made absolute against the working directory when known.
pub fn normalize(path: &str) -> String {
    let unified = unify_separators(path);
    let absolute = if is_absolute(&unified) {
        unified
    } else {
        match std::env::current_dir() {
            Ok(cwd) => combine(&from_os_path(&cwd), &unified),
            Err(_) => unified,
        }
    };
    let mut kept: Vec<String> = Vec::new();
    for segment in split(&absolute, false) {
        match segment.as_str() {
            "." => {}
            ".." => match kept.last().map(String::as_str) {
                Some(s) if s == "/" || is_drive_token(s.trim_end_matches('/')) => {}
                Some(s) if s != ".." => {
                    kept.pop();
                }
                _ => kept.push(segment),
            },
            _ => kept.push(segment),
        }
    }
    let mut out = String::new();
    for segment in &kept {
        append(&mut out, segment);
    }
    out
}
