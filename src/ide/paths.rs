//! Path algebra for the remote namespace.
//!
//! Paths are absolute and `/`-separated. Folders end with `/`, files do not,
//! and the root is `/`.

use crate::error::{AppError, Result};

/// Root of the remote namespace.
pub const ROOT: &str = "/";

/// Folders that can never be deleted or renamed from the IDE.
pub const PROTECTED_FOLDERS: &[&str] = &["/", "/system/", "/modules/", "/data/", "/config/", "/etc/"];

/// Prefixes of folders that belong to the backend itself.
const SYSTEM_PREFIXES: &[&str] = &["/system/", "/misc/", "/data/", "/config/"];

/// HTTP verbs an endpoint file may declare as its second-to-last extension.
const HTTP_VERBS: &[&str] = &["get", "post", "put", "patch", "delete"];

pub fn is_folder(path: &str) -> bool {
    path.ends_with('/')
}

/// Last segment of a path, without the trailing `/` of folders.
pub fn name_of(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Folder containing `path`. The root is its own parent.
pub fn parent_of(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => trimmed[..=idx].to_string(),
        None => ROOT.to_string(),
    }
}

/// Depth from the root: `/` is 0, `/a/` and `/a.hl` are 1.
pub fn level_of(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

pub fn is_system(path: &str) -> bool {
    SYSTEM_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED_FOLDERS.contains(&path)
}

/// Check a single file or folder name against `[a-zA-Z0-9_.-]+`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".into()));
    }
    if name == "." || name == ".." {
        return Err(AppError::Validation(format!("'{}' is not a valid name", name)));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(AppError::Validation(format!(
            "'{}' contains the character '{}'",
            name, bad
        )));
    }
    Ok(())
}

/// Path of a new entry named `name` inside `folder`.
pub fn child_path(folder: &str, name: &str, is_folder: bool) -> String {
    let mut path = String::with_capacity(folder.len() + name.len() + 1);
    path.push_str(folder);
    if !folder.ends_with('/') {
        path.push('/');
    }
    path.push_str(name);
    if is_folder {
        path.push('/');
    }
    path
}

/// Replace the last segment of `path`, keeping the folder suffix if any.
pub fn renamed(path: &str, new_name: &str) -> String {
    child_path(&parent_of(path), new_name, is_folder(path))
}

/// Rewrite `path` from `old_prefix` to `new_prefix`.
///
/// Returns `None` when `path` is not at or below `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    path.strip_prefix(old_prefix)
        .map(|rest| format!("{}{}", new_prefix, rest))
}

/// Whether `path` equals `folder` or lives beneath it.
pub fn is_under(path: &str, folder: &str) -> bool {
    is_folder(folder) && path.starts_with(folder)
}

/// Module name when `folder` is `/modules/<name>/` or below it.
pub fn module_of(folder: &str) -> Option<&str> {
    let mut segments = folder.split('/');
    // Leading empty segment from the absolute path.
    segments.next()?;
    if segments.next()? != "modules" {
        return None;
    }
    let name = segments.next()?;
    // A trailing segment must follow, otherwise `name` is a file.
    segments.next()?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

pub fn extension(path: &str) -> Option<&str> {
    let name = name_of(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// HTTP endpoint `(url, verb)` served by a Hyperlambda file, if it is one.
///
/// `/modules/foo/bar.get.hl` is served as `GET magic/modules/foo/bar`.
pub fn endpoint_of(path: &str) -> Option<(String, String)> {
    if !(path.starts_with("/modules/") || path.starts_with("/system/")) {
        return None;
    }
    let stem = path.strip_suffix(".hl")?;
    let dot = stem.rfind('.')?;
    let verb = &stem[dot + 1..];
    if !HTTP_VERBS.contains(&verb) {
        return None;
    }
    Some((format!("magic{}", &stem[..dot]), verb.to_string()))
}
