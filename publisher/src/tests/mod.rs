use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Result};
use tempfile::TempDir;

use crate::command::{CommandRunner, CommandSpec, StepOutcome};
use crate::config::PipelineConfig;
use crate::notify::{Notifier, WebhookPayload};


/// Runner that records every command and answers from a script instead of
/// spawning processes. Commands with no scripted answer succeed.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    pub calls: Vec<CommandSpec>,
    responses: Vec<(String, StepOutcome)>,
    launch_failures: Vec<String>,
    writes: Vec<(String, PathBuf, String)>,
}

impl ScriptedRunner {
    pub fn new() -> ScriptedRunner {
        ScriptedRunner::default()
    }

    /// Answer commands whose command line contains `needle`
    pub fn respond(mut self, needle: &str, outcome: StepOutcome) -> ScriptedRunner {
        self.responses.push((needle.to_string(), outcome));
        self
    }

    pub fn fail_launch(mut self, needle: &str) -> ScriptedRunner {
        self.launch_failures.push(needle.to_string());
        self
    }

    /// Write `contents` to `path` when a matching command succeeds, the way the
    /// converter leaves its JSON behind
    pub fn write_on(mut self, needle: &str, path: PathBuf, contents: &str) -> ScriptedRunner {
        self.writes
            .push((needle.to_string(), path, contents.to_string()));
        self
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.iter().map(|spec| spec.to_string()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, spec: &CommandSpec) -> io::Result<StepOutcome> {
        self.calls.push(spec.clone());
        let line = spec.to_string();

        if self.launch_failures.iter().any(|needle| line.contains(needle)) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: not found", spec.program),
            ));
        }

        let outcome = self
            .responses
            .iter()
            .find(|(needle, _)| line.contains(needle))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| StepOutcome::exited(0));

        if outcome.success() {
            for (needle, path, contents) in &self.writes {
                if line.contains(needle) {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(path, contents)?;
                }
            }
        }

        Ok(outcome)
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub posts: Vec<(String, WebhookPayload)>,
    pub fail: bool,
}

impl Notifier for RecordingNotifier {
    fn post(&mut self, url: &str, payload: &WebhookPayload) -> Result<u16> {
        self.posts.push((url.to_string(), payload.clone()));
        if self.fail {
            return Err(anyhow!("connection refused"));
        }
        Ok(204)
    }
}

/// Scratch directories for CSV, JSON and the destination repository
pub struct Workspace {
    pub dir: TempDir,
    pub config: PipelineConfig,
}

impl Workspace {
    pub fn new() -> Workspace {
        let dir = tempfile::tempdir().expect("create temp dir");
        Workspace::in_repo(dir, None)
    }

    pub fn in_repo(dir: TempDir, repo_dir: Option<PathBuf>) -> Workspace {
        let repo_dir = repo_dir.unwrap_or_else(|| dir.path().join("repo"));
        let mut config = PipelineConfig::new(repo_dir);
        config.csv_dir = dir.path().join("csv");
        config.json_dir = dir.path().join("json");
        Workspace { dir, config }
    }

    pub fn json_path(&self, date: &str) -> PathBuf {
        autorace_scraper::layout::json_path(&self.config.json_dir, date)
    }

    pub fn dest_path(&self, date: &str) -> PathBuf {
        self.config
            .repo_dir
            .join(&self.config.repo_subdir)
            .join(autorace_scraper::layout::json_file_name(date))
    }
}

pub fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

pub fn run_git(root: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .status()
        .expect("run git");
    assert!(
        status.success(),
        "git command failed: git -C {:?} {:?}",
        root,
        args
    );
}

pub fn git_stdout(root: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .expect("run git");
    assert!(output.status.success(), "git {:?} failed", args);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A bare "remote" plus a clone of it with one commit pushed upstream.
pub struct GitFixture {
    pub dir: TempDir,
    pub remote: PathBuf,
    pub clone: PathBuf,
}

impl GitFixture {
    pub fn new() -> GitFixture {
        let dir = tempfile::tempdir().expect("create temp dir");
        let remote = dir.path().join("remote.git");
        let clone = dir.path().join("clone");

        run_git(dir.path(), &["init", "--bare", remote.to_str().unwrap()]);
        run_git(
            dir.path(),
            &["clone", remote.to_str().unwrap(), clone.to_str().unwrap()],
        );
        run_git(&clone, &["config", "user.email", "publisher@example.com"]);
        run_git(&clone, &["config", "user.name", "Autorace Publisher"]);
        run_git(&clone, &["config", "commit.gpgsign", "false"]);

        fs::write(clone.join("README.md"), "race lists\n").expect("write README");
        run_git(&clone, &["add", "README.md"]);
        run_git(&clone, &["commit", "-m", "initial"]);
        run_git(&clone, &["push", "-u", "origin", "HEAD"]);

        GitFixture { dir, remote, clone }
    }

    /// Commit subjects on the remote, newest first
    pub fn remote_subjects(&self) -> Vec<String> {
        git_stdout(&self.remote, &["log", "--all", "--format=%s"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Scratch space next to the repositories, with the clone as the target
    pub fn workspace(&self) -> Workspace {
        let dir = tempfile::tempdir_in(self.dir.path()).expect("create temp dir");
        Workspace::in_repo(dir, Some(self.clone.clone()))
    }
}
