use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::command::{run_required, run_tolerant, CommandRunner, CommandSpec, StepOutcome};
use crate::context::RunContext;
use crate::error::PipelineError;

/// What happened to the commit. Only `Committed` means new history was made,
/// but none of these stops the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NothingToCommit,
    Failed { code: Option<i32>, output: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub destination: PathBuf,
    pub staged: bool,
    pub commit: CommitOutcome,
}

/// A git invocation inside `repo`. Messages stay untranslated so the commit
/// output can be classified whatever the host locale.
pub fn git_command(repo: &Path, args: &[&str]) -> CommandSpec {
    CommandSpec::new("git")
        .args(args)
        .current_dir(repo)
        .env("LC_ALL", "C")
        .build()
}

fn classify_commit(outcome: &StepOutcome) -> CommitOutcome {
    if outcome.success() {
        CommitOutcome::Committed
    } else if outcome.mentions("nothing to commit")
        || outcome.mentions("nothing added to commit")
        || outcome.mentions("no changes added to commit")
    {
        CommitOutcome::NothingToCommit
    } else {
        let output = format!("{}{}", outcome.stdout, outcome.stderr);
        CommitOutcome::Failed {
            code: outcome.code,
            output: output.trim().to_string(),
        }
    }
}

/// Copy the day's JSON into the repository and push it.
///
/// A missing JSON file stops the run before anything is touched. Staging and
/// committing may fail without stopping the run; pull and push may not. Git
/// runs with the repository as its working directory, so the caller's own
/// working directory never changes.
pub fn publish_artifact(
    ctx: &RunContext,
    runner: &mut dyn CommandRunner,
) -> Result<PublishReport, PipelineError> {
    let source = ctx.json_path();
    if !source.is_file() {
        error!("JSON not found: {}", source.display());
        return Err(PipelineError::MissingArtifact(source));
    }

    let dest_dir = ctx.dest_dir();
    fs::create_dir_all(&dest_dir).map_err(|e| PipelineError::CreateDir {
        path: dest_dir.clone(),
        source: e,
    })?;

    let destination = ctx.dest_path();
    fs::copy(&source, &destination).map_err(|e| PipelineError::Copy {
        from: source.clone(),
        to: destination.clone(),
        source: e,
    })?;
    info!("Copied {} -> {}", source.display(), destination.display());

    let relative = ctx.repo_relative_path().to_string_lossy().into_owned();

    let add = run_tolerant(
        runner,
        "git add",
        &git_command(&ctx.repo_dir, &["add", relative.as_str()]),
    );
    let staged = add.success();
    if !staged {
        warn!("git add failed, continuing: {}", add.stderr.trim());
    }

    let message = ctx.commit_message();
    let commit = classify_commit(&run_tolerant(
        runner,
        "git commit",
        &git_command(&ctx.repo_dir, &["commit", "-m", message.as_str()]),
    ));
    match &commit {
        CommitOutcome::Committed => info!("Committed \"{}\"", message),
        CommitOutcome::NothingToCommit => info!("Nothing to commit for {}", ctx.date),
        CommitOutcome::Failed { code, output } => {
            warn!("git commit failed ({:?}), continuing: {}", code, output)
        }
    }

    run_required(
        runner,
        "git pull",
        &git_command(&ctx.repo_dir, &["pull", "--rebase"]),
    )?;
    run_required(runner, "git push", &git_command(&ctx.repo_dir, &["push"]))?;
    info!("Pushed {}", relative);

    Ok(PublishReport {
        destination,
        staged,
        commit,
    })
}
