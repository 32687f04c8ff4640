// src/system/fetcher.rs

//! Fetch strategies: each produces a local file from a URI. The local
//! strategy is a plain copy; the remote strategies shell out to an external
//! transfer tool through the command template engine. Picking a strategy
//! for a given URI scheme is the caller's business.

use crate::{
    core::template::{CommandTemplate, TemplateError},
    system::process::{ProcessError, ProcessRunner, SystemProcess},
};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to copy '{uri}' to '{destination}': {source}")]
    Copy {
        uri: String,
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not stage a temporary download file for '{uri}': {source}")]
    Stage {
        uri: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not move the downloaded file for '{uri}' into place: {source}")]
    Persist {
        uri: String,
        #[source]
        source: tempfile::PersistError,
    },
    #[error("Failed to build the fetch command for '{uri}': {source}")]
    Command {
        uri: String,
        #[source]
        source: TemplateError,
    },
    #[error("Failed to fetch '{uri}': {source}")]
    Download {
        uri: String,
        #[source]
        source: ProcessError,
    },
}

/// Produces a local file at `destination` from `uri`.
pub trait Fetcher {
    fn fetch(&self, uri: &str, destination: &Path) -> Result<(), FetchError>;
}

/// Local-filesystem strategy: the URI is a path (an optional `file://`
/// prefix is accepted) and fetching is a plain copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFetcher;

impl Fetcher for CopyFetcher {
    fn fetch(&self, uri: &str, destination: &Path) -> Result<(), FetchError> {
        let source = uri.strip_prefix("file://").unwrap_or(uri);
        log::debug!("Copying '{source}' to '{}'", destination.display());
        fs::copy(source, destination).map_err(|e| FetchError::Copy {
            uri: uri.to_string(),
            destination: destination.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

/// Remote strategy shelling out to `curl`.
pub struct CurlFetcher {
    exe: PathBuf,
    runner: Box<dyn ProcessRunner>,
}

impl CurlFetcher {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self::with_runner(exe, Box::new(SystemProcess))
    }

    /// Fetcher with a caller-supplied process boundary.
    pub fn with_runner(exe: impl Into<PathBuf>, runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            exe: exe.into(),
            runner,
        }
    }
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, uri: &str, destination: &Path) -> Result<(), FetchError> {
        download(
            &self.exe,
            &["--fail", "--silent", "--show-error", "--output"],
            uri,
            destination,
            self.runner.as_ref(),
        )
    }
}

impl fmt::Debug for CurlFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurlFetcher")
            .field("exe", &self.exe)
            .finish_non_exhaustive()
    }
}

/// Remote strategy shelling out to `wget`.
pub struct WgetFetcher {
    exe: PathBuf,
    runner: Box<dyn ProcessRunner>,
}

impl WgetFetcher {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self::with_runner(exe, Box::new(SystemProcess))
    }

    /// Fetcher with a caller-supplied process boundary.
    pub fn with_runner(exe: impl Into<PathBuf>, runner: Box<dyn ProcessRunner>) -> Self {
        Self {
            exe: exe.into(),
            runner,
        }
    }
}

impl Fetcher for WgetFetcher {
    fn fetch(&self, uri: &str, destination: &Path) -> Result<(), FetchError> {
        download(
            &self.exe,
            &["--quiet", "--output-document"],
            uri,
            destination,
            self.runner.as_ref(),
        )
    }
}

impl fmt::Debug for WgetFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgetFetcher")
            .field("exe", &self.exe)
            .finish_non_exhaustive()
    }
}

/// Downloads into a temporary file next to `destination`, then moves it
/// into place, so a failed transfer never leaves a truncated destination
/// behind. The last tool argument before the URI names the staging file.
fn download(
    exe: &Path,
    args: &[&str],
    uri: &str,
    destination: &Path,
    runner: &dyn ProcessRunner,
) -> Result<(), FetchError> {
    let dir = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let staging = tempfile::NamedTempFile::new_in(dir).map_err(|e| FetchError::Stage {
        uri: uri.to_string(),
        source: e,
    })?;

    let mut template = CommandTemplate::from_path(exe);
    template
        .add_arguments(args.iter().copied())
        .add_argument(staging.path().to_string_lossy())
        .add_argument(uri);
    let context = template.context().map_err(|e| FetchError::Command {
        uri: uri.to_string(),
        source: e,
    })?;

    log::debug!("Fetching '{uri}' via '{}'", exe.display());
    runner
        .check_sync_execute(&context)
        .map_err(|e| FetchError::Download {
            uri: uri.to_string(),
            source: e,
        })?;

    staging.persist(destination).map_err(|e| FetchError::Persist {
        uri: uri.to_string(),
        source: e,
    })?;
    Ok(())
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::process::ExecutionContext;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    struct RecordingRunner {
        contexts: Arc<Mutex<Vec<ExecutionContext>>>,
        exit_code: i32,
    }

    impl ProcessRunner for RecordingRunner {
        fn sync_execute(&self, context: &ExecutionContext) -> Result<i32, ProcessError> {
            self.contexts.lock().unwrap().push(context.clone());
            Ok(self.exit_code)
        }
    }

    #[test]
    fn copy_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let destination = dir.path().join("copy.txt");
        fs::write(&source, b"payload").unwrap();

        CopyFetcher
            .fetch(&source.to_string_lossy(), &destination)
            .unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"payload");
    }

    #[test]
    fn copy_accepts_file_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let destination = dir.path().join("copy.txt");
        fs::write(&source, b"payload").unwrap();

        let uri = format!("file://{}", source.display());
        CopyFetcher.fetch(&uri, &destination).unwrap();
        assert!(destination.is_file());
    }

    #[test]
    fn copy_failure_reports_the_uri() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("copy.txt");
        match CopyFetcher.fetch("/no/such/file", &destination) {
            Err(FetchError::Copy { uri, .. }) => assert_eq!(uri, "/no/such/file"),
            other => panic!("expected Copy error, got {other:?}"),
        }
    }

    #[test]
    fn curl_builds_the_expected_command() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("artifact.bin");
        let runner = RecordingRunner::default();
        let fetcher = CurlFetcher::with_runner("curl", Box::new(runner.clone()));

        fetcher.fetch("https://example.com/a.bin", &destination).unwrap();

        let contexts = runner.contexts.lock().unwrap();
        let arguments = &contexts[0].arguments;
        assert_eq!(arguments[0], "curl");
        assert_eq!(&arguments[1..4], ["--fail", "--silent", "--show-error"]);
        assert_eq!(arguments[4], "--output");
        assert_eq!(arguments.last().unwrap(), "https://example.com/a.bin");
        // The transfer lands in a staging file which is then moved over
        // the destination.
        assert_ne!(arguments[5], destination.to_string_lossy());
        assert!(destination.is_file());
    }

    #[test]
    fn wget_builds_the_expected_command() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("artifact.bin");
        let runner = RecordingRunner::default();
        let fetcher = WgetFetcher::with_runner("/usr/bin/wget", Box::new(runner.clone()));

        fetcher.fetch("https://example.com/a.bin", &destination).unwrap();

        let contexts = runner.contexts.lock().unwrap();
        let arguments = &contexts[0].arguments;
        assert_eq!(arguments[0], "/usr/bin/wget");
        assert_eq!(&arguments[1..3], ["--quiet", "--output-document"]);
        assert_eq!(arguments.last().unwrap(), "https://example.com/a.bin");
    }

    #[test]
    fn failed_download_reports_uri_and_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("artifact.bin");
        let runner = RecordingRunner {
            exit_code: 22,
            ..RecordingRunner::default()
        };
        let fetcher = CurlFetcher::with_runner("curl", Box::new(runner));

        match fetcher.fetch("https://example.com/missing", &destination) {
            Err(FetchError::Download { uri, source }) => {
                assert_eq!(uri, "https://example.com/missing");
                assert!(matches!(source, ProcessError::NonZeroExit { code: 22, .. }));
            }
            other => panic!("expected Download error, got {other:?}"),
        }
        // Nothing was moved over the destination.
        assert!(!destination.exists());
    }
}
