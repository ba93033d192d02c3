use std::path::Path;

use chrono::Utc;
use log::info;

use crate::command::{run_required, CommandRunner, CommandSpec};
use crate::config::PipelineConfig;
use crate::context::{resolve_date, RunContext};
use crate::error::PipelineError;
use crate::notify::{notify, update_message, Notifier, NotifyOutcome};
use crate::publish::{publish_artifact, PublishReport};

/// An external program run for the day before publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramStep {
    pub name: &'static str,
    pub spec: CommandSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub date: String,
    pub publish: PublishReport,
    pub notification: NotifyOutcome,
}

/// Build the command for one program. `.py` files go through the interpreter,
/// anything else is executed directly. The date is the only argument.
pub fn program_command(python: &str, program: &Path, ctx: &RunContext) -> CommandSpec {
    let mut spec = match program.extension() {
        Some(ext) if ext == "py" => {
            let mut spec = CommandSpec::new(python);
            spec.arg(program);
            spec
        }
        _ => CommandSpec::new(program),
    };
    spec.arg(&ctx.date)
        .env("AUTORACE_CSV_DIR", &ctx.csv_dir)
        .env("AUTORACE_JSON_DIR", &ctx.json_dir);
    spec
}

/// The programs run before publishing, in order.
pub fn program_steps(config: &PipelineConfig, ctx: &RunContext) -> Vec<ProgramStep> {
    vec![
        ProgramStep {
            name: "scrape",
            spec: program_command(&config.python, &config.scraper, ctx),
        },
        ProgramStep {
            name: "convert",
            spec: program_command(&config.python, &config.converter, ctx),
        },
    ]
}

/// One run of the daily pipeline: scrape, convert, publish, notify.
pub struct Pipeline<R: CommandRunner, N: Notifier> {
    config: PipelineConfig,
    runner: R,
    notifier: N,
}

impl<R: CommandRunner, N: Notifier> Pipeline<R, N> {
    pub fn new(config: PipelineConfig, runner: R, notifier: N) -> Pipeline<R, N> {
        Pipeline {
            config,
            runner,
            notifier,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run every stage in order, stopping at the first fatal failure. Nothing
    /// already copied or committed is rolled back.
    pub fn run(&mut self, date: Option<&str>) -> Result<RunReport, PipelineError> {
        let ctx = RunContext::new(&self.config, resolve_date(date, Utc::now()));
        info!("Running autorace pipeline for {}", ctx.date);

        for step in program_steps(&self.config, &ctx) {
            info!("{}: {}", step.name, step.spec);
            run_required(&mut self.runner, step.name, &step.spec)?;
        }

        let publish = publish_artifact(&ctx, &mut self.runner)?;

        let notification = notify(
            &mut self.notifier,
            self.config.webhook_url.as_deref(),
            &update_message(&ctx),
        );

        info!("Done {}", ctx.date);
        Ok(RunReport {
            date: ctx.date,
            publish,
            notification,
        })
    }
}
