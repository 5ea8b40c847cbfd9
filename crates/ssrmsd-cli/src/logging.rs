use crate::error::{CliError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{
        self,
        format::{DefaultFields, Format, Full},
    },
    prelude::*,
};

/// Plain-text layer for `--log-file`: no colors, with thread ids and targets.
type FileLayer<S> = fmt::Layer<S, DefaultFields, Format<Full>, File>;

/// Maps `-v` occurrences and `--quiet` to the global level; warnings show by default.
fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Creates (or truncates) the log file, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    let log_file_error = |source| CliError::LogFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(log_file_error)?;
    }
    File::create(path).map_err(log_file_error)
}

fn file_layer<S>(file: File) -> FileLayer<S> {
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
}

/// Installs the global subscriber: compact stderr output plus an optional log file,
/// both under the same level filter.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => Some(file_layer(open_log_file(&path)?)),
        None => None,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::{debug, info};

    #[test]
    fn level_filter_follows_verbosity_and_quiet() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn open_log_file_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("helix").join("ssrmsd.log");
        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn open_log_file_names_the_path_it_could_not_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_log_file(dir.path()).unwrap_err();
        match err {
            CliError::LogFile { path, .. } => assert_eq!(path, dir.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn file_layer_writes_plain_text_with_thread_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssrmsd.log");
        let subscriber = tracing_subscriber::registry().with(file_layer(open_log_file(&path).unwrap()));

        tracing::subscriber::with_default(subscriber, || {
            info!(windows = 3, "Template resolved");
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO"));
        assert!(content.contains("ThreadId"));
        assert!(content.contains("Template resolved windows=3"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    #[serial]
    fn setup_logging_filters_the_log_file_and_installs_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssrmsd.log");
        setup_logging(1, false, Some(path.clone())).unwrap();

        info!("Trajectory evaluated for the log file");
        debug!("Window detail hidden below info");

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Trajectory evaluated for the log file"));
        assert!(!content.contains("Window detail hidden below info"));

        assert!(matches!(
            setup_logging(0, false, None),
            Err(CliError::Other(_))
        ));
    }
}
