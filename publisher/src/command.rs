use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::PipelineError;

/// An external command to run: program, arguments, working directory and
/// extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new<S: AsRef<OsStr>>(program: S) -> CommandSpec {
        CommandSpec {
            program: program.as_ref().to_string_lossy().into_owned(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut CommandSpec {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<Iter, Str>(&mut self, args: Iter) -> &mut CommandSpec
    where
        Iter: IntoIterator<Item = Str>,
        Str: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    pub fn current_dir<P: AsRef<Path>>(&mut self, dir: P) -> &mut CommandSpec {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env<K: Into<String>, V: AsRef<OsStr>>(&mut self, key: K, value: V) -> &mut CommandSpec {
        self.envs
            .push((key.into(), value.as_ref().to_string_lossy().into_owned()));
        self
    }

    pub fn build(&mut self) -> CommandSpec {
        self.clone()
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit code and captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl StepOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn exited(code: i32) -> StepOutcome {
        StepOutcome {
            code: Some(code),
            ..StepOutcome::default()
        }
    }

    pub fn with_stdout<S: Into<String>>(mut self, stdout: S) -> StepOutcome {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr<S: Into<String>>(mut self, stderr: S) -> StepOutcome {
        self.stderr = stderr.into();
        self
    }

    /// Case-insensitive search of both output streams.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.stdout.to_lowercase().contains(&needle) || self.stderr.to_lowercase().contains(&needle)
    }
}

/// Runs external commands to completion. Tests swap in a scripted runner.
pub trait CommandRunner {
    fn run(&mut self, spec: &CommandSpec) -> io::Result<StepOutcome>;
}

/// Runs commands as real child processes and waits for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> io::Result<StepOutcome> {
        let output = spec
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(StepOutcome {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn log_output(step: &str, outcome: &StepOutcome) {
    for line in outcome.stdout.lines() {
        debug!("[{}] {}", step, line);
    }
    for line in outcome.stderr.lines() {
        debug!("[{}] {}", step, line);
    }
}

/// Run a step whose failure is tolerated. A launch failure is folded into the
/// outcome with no exit code.
pub fn run_tolerant(runner: &mut dyn CommandRunner, step: &str, spec: &CommandSpec) -> StepOutcome {
    debug!("{}: {}", step, spec);
    match runner.run(spec) {
        Ok(outcome) => {
            log_output(step, &outcome);
            outcome
        }
        Err(e) => StepOutcome {
            code: None,
            stdout: String::new(),
            stderr: format!("failed to launch {}: {}", spec.program, e),
        },
    }
}

/// Run a step that must succeed.
pub fn run_required(
    runner: &mut dyn CommandRunner,
    step: &'static str,
    spec: &CommandSpec,
) -> Result<StepOutcome, PipelineError> {
    debug!("{}: {}", step, spec);
    let outcome = runner.run(spec).map_err(|source| PipelineError::Launch {
        step,
        program: spec.program.clone(),
        source,
    })?;
    log_output(step, &outcome);

    if !outcome.success() {
        return Err(PipelineError::StepFailed {
            step,
            code: outcome.code,
            stderr: outcome.stderr.trim().to_string(),
        });
    }
    Ok(outcome)
}
