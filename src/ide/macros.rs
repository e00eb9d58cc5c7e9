//! Macro invocation: argument auto-fill and result parsing.

use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::ide::paths;
use crate::store::MacroDefinition;

/// Role used for `auth`/`role`/`roles` arguments when none is configured.
pub const DEFAULT_ROLE: &str = "root";

/// What the IDE should do after a macro ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOutcome {
    Success,
    /// Reload the given folder.
    RefreshFolder(String),
    /// Reload from the root.
    RefreshAll,
}

impl MacroOutcome {
    pub fn parse(result: &str) -> Self {
        match result.split_once('|') {
            Some(("folders-changed", path)) if !path.is_empty() => {
                let folder = if paths::is_folder(path) {
                    path.to_string()
                } else {
                    format!("{}/", path)
                };
                MacroOutcome::RefreshFolder(folder)
            }
            _ if result == "folders-changed" => MacroOutcome::RefreshAll,
            _ => {
                if result != "success" {
                    tracing::warn!(result, "unrecognized macro result, treating as success");
                }
                MacroOutcome::Success
            }
        }
    }
}

/// Split `name key=value key2=value2` into the macro name and its arguments.
pub fn parse_invocation(input: &str) -> Result<(String, BTreeMap<String, String>)> {
    let mut parts = input.split_whitespace();
    let name = parts
        .next()
        .ok_or_else(|| AppError::Validation("macro name cannot be empty".into()))?;
    let mut args = BTreeMap::new();
    for part in parts {
        let (key, value) = part.split_once('=').ok_or_else(|| {
            AppError::Validation(format!("expected key=value, got '{}'", part))
        })?;
        if key.is_empty() {
            return Err(AppError::Validation(format!("missing key in '{}'", part)));
        }
        args.insert(key.to_string(), value.to_string());
    }
    Ok((name.to_string(), args))
}

/// Complete the arguments for `definition`.
///
/// Explicit values win. `module`, `module-name` and `database` default to the
/// module of `active_folder`; `auth`, `role` and `roles` to `default_role`.
pub fn fill_arguments(
    definition: &MacroDefinition,
    active_folder: &str,
    default_role: &str,
    provided: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    if let Some(unknown) = provided
        .keys()
        .find(|k| !definition.arguments.iter().any(|a| &a.name == *k))
    {
        return Err(AppError::Validation(format!(
            "macro '{}' has no argument '{}'",
            definition.name, unknown
        )));
    }

    let module = paths::module_of(active_folder);
    let mut args = provided;
    for arg in &definition.arguments {
        if args.contains_key(&arg.name) {
            continue;
        }
        let value = match arg.name.as_str() {
            "module" | "module-name" | "database" => module.map(str::to_string),
            "auth" | "role" | "roles" => Some(default_role.to_string()),
            _ => None,
        };
        if let Some(value) = value {
            args.insert(arg.name.clone(), value);
        }
    }

    let missing: Vec<&str> = definition
        .arguments
        .iter()
        .filter(|a| a.mandatory && !args.contains_key(&a.name))
        .map(|a| a.name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "macro '{}' is missing {}",
            definition.name,
            missing.join(", ")
        )));
    }
    Ok(args)
}
