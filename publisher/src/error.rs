use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code reported when the converter left no JSON artifact behind.
pub const EXIT_MISSING_ARTIFACT: i32 = 2;

/// Exit code for failures that carry no child exit code of their own.
pub const EXIT_FAILURE: i32 = 1;

/// Fatal pipeline failures. Tolerated failures never become one of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{step} failed ({}){}", describe_exit(.code), describe_stderr(.stderr))]
    StepFailed {
        step: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to launch {step} ({program}): {source}")]
    Launch {
        step: &'static str,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("expected JSON not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    /// Process exit code for this failure: 2 for a missing artifact, the failing
    /// child's own code when it has one, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::MissingArtifact(_) => EXIT_MISSING_ARTIFACT,
            PipelineError::StepFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => EXIT_FAILURE,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}
