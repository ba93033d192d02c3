pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod publish;

#[cfg(test)]
pub mod tests;

pub use crate::command::{CommandRunner, CommandSpec, StepOutcome, SystemRunner};
pub use crate::config::PipelineConfig;
pub use crate::context::{resolve_date, RunContext};
pub use crate::error::{PipelineError, EXIT_MISSING_ARTIFACT};
pub use crate::notify::{Notifier, NotifyOutcome, WebhookNotifier, WebhookPayload};
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::publish::{CommitOutcome, PublishReport};
