// src/core/resolver.rs

//! Maps logical executable/library names to concrete filesystem paths.
//!
//! Two configured tables are consulted in order: `alias` substitutes one
//! name for another, `absolute` short-circuits to a concrete path. Anything
//! not covered falls back to OS default rules (absolute/relative
//! passthrough, `PATH` search for bare executable names, library-path
//! search with platform naming for bare library names).

use crate::models::ResolverConfig;
use std::collections::HashMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("'{0}' could not be resolved to an existing path.")]
    NotFound(PathBuf),
    #[error("Configured path '{template}' could not be expanded: {reason}")]
    BadPath { template: String, reason: String },
}

/// Resolves logical tool and library names to concrete paths.
///
/// A default-constructed resolver applies only the OS rules; one built
/// [`Self::from_config`] consults the configured tables first. Executables
/// and libraries share the same tables; only the OS fallback differs.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    alias: HashMap<PathBuf, PathBuf>,
    absolute: HashMap<PathBuf, PathBuf>,
}

impl Resolver {
    /// Resolver using OS default rules only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver backed by configured alias/absolute tables. Table values
    /// may use `~` and environment variables; expansion happens here, once.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ResolveError> {
        Ok(Self {
            alias: expand_table(&config.alias)?,
            absolute: expand_table(&config.absolute)?,
        })
    }

    fn apply_alias<'a>(&'a self, name: &'a Path) -> &'a Path {
        match self.alias.get(name) {
            Some(substitute) => {
                log::trace!(
                    "Alias '{}' -> '{}'",
                    name.display(),
                    substitute.display()
                );
                substitute.as_path()
            }
            None => name,
        }
    }

    /// Resolves an executable name.
    pub fn find_executable(&self, exe: &Path) -> Result<PathBuf, ResolveError> {
        let name = self.apply_alias(exe);
        if let Some(path) = self.absolute.get(name) {
            return Ok(path.clone());
        }
        find_executable_os(name).ok_or_else(|| ResolveError::NotFound(name.to_path_buf()))
    }

    /// Resolves a shared-library name.
    pub fn find_library(&self, lib: &Path) -> Result<PathBuf, ResolveError> {
        let name = self.apply_alias(lib);
        if let Some(path) = self.absolute.get(name) {
            return Ok(path.clone());
        }
        find_library_os(name).ok_or_else(|| ResolveError::NotFound(name.to_path_buf()))
    }
}

fn expand_table(table: &HashMap<String, String>) -> Result<HashMap<PathBuf, PathBuf>, ResolveError> {
    table
        .iter()
        .map(|(name, target)| {
            let expanded = shellexpand::full(target).map_err(|e| ResolveError::BadPath {
                template: target.clone(),
                reason: e.to_string(),
            })?;
            Ok((PathBuf::from(name), PathBuf::from(expanded.into_owned())))
        })
        .collect()
}

/// Searches the system `PATH` for `name`'s file name, honoring the
/// platform's executable naming rules. Used both by the resolver's OS
/// fallback and by the process boundary's `use_path` handling.
pub fn search_path(name: &Path) -> Option<PathBuf> {
    let file_name = name.file_name()?;
    let paths = env::var_os("PATH")?;
    find_in_dirs(&paths, &executable_candidates(file_name), is_executable)
}

/// OS-default executable lookup: absolute paths and paths with directory
/// components pass through when they exist and are executable; a bare name
/// is searched on `PATH`.
fn find_executable_os(name: &Path) -> Option<PathBuf> {
    if name.as_os_str().is_empty() {
        return None;
    }
    if !name.is_absolute() && is_bare_name(name) {
        return search_path(name);
    }
    is_executable(name).then(|| name.to_path_buf())
}

/// OS-default library lookup: paths pass through when the file exists; a
/// bare name is decorated with the platform prefix/suffix and searched on
/// the platform's library path.
fn find_library_os(name: &Path) -> Option<PathBuf> {
    if name.as_os_str().is_empty() {
        return None;
    }
    if !name.is_absolute() && is_bare_name(name) {
        let paths = env::var_os(LIBRARY_PATH_VAR)?;
        return find_in_dirs(&paths, &library_candidates(name.as_os_str()), Path::is_file);
    }
    name.is_file().then(|| name.to_path_buf())
}

fn is_bare_name(name: &Path) -> bool {
    let mut components = name.components();
    components.next().is_some() && components.next().is_none()
}

fn find_in_dirs(
    search_paths: &OsStr,
    candidates: &[OsString],
    check: fn(&Path) -> bool,
) -> Option<PathBuf> {
    for dir in env::split_paths(search_paths) {
        for candidate in candidates {
            let path = dir.join(candidate);
            if check(&path) {
                return Some(path);
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(windows)]
fn executable_candidates(name: &OsStr) -> Vec<OsString> {
    if Path::new(name).extension().is_some() {
        return vec![name.to_os_string()];
    }
    let mut candidates: Vec<OsString> = ["exe", "bat", "cmd", "com"]
        .iter()
        .map(|ext| {
            let mut candidate = name.to_os_string();
            candidate.push(".");
            candidate.push(ext);
            candidate
        })
        .collect();
    candidates.push(name.to_os_string());
    candidates
}

#[cfg(not(windows))]
fn executable_candidates(name: &OsStr) -> Vec<OsString> {
    vec![name.to_os_string()]
}

fn library_candidates(name: &OsStr) -> Vec<OsString> {
    if Path::new(name).extension().is_some() {
        return vec![name.to_os_string()];
    }
    let mut decorated = OsString::from(LIBRARY_PREFIX);
    decorated.push(name);
    decorated.push(LIBRARY_SUFFIX);
    vec![decorated, name.to_os_string()]
}

#[cfg(windows)]
const LIBRARY_PATH_VAR: &str = "PATH";
#[cfg(windows)]
const LIBRARY_PREFIX: &str = "";
#[cfg(windows)]
const LIBRARY_SUFFIX: &str = ".dll";

#[cfg(target_os = "macos")]
const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(target_os = "macos")]
const LIBRARY_PREFIX: &str = "lib";
#[cfg(target_os = "macos")]
const LIBRARY_SUFFIX: &str = ".dylib";

#[cfg(all(unix, not(target_os = "macos")))]
const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";
#[cfg(all(unix, not(target_os = "macos")))]
const LIBRARY_PREFIX: &str = "lib";
#[cfg(all(unix, not(target_os = "macos")))]
const LIBRARY_SUFFIX: &str = ".so";

// MARK: --- UNIT TESTS ---
