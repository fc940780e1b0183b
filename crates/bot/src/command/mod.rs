pub mod domain;
mod services;

pub use domain::{CommandAction, CommandContext, CommandOutcome, Outgoing};

use crate::config::BotConfig;
use anyhow::{Context as AnyhowContext, Result};
use services::Services;
use sponsor_core::{Allocator, Invocation};
use sponsor_platform::Platform;
use std::sync::Arc;
use std::time::Instant;

pub const THINKING: &str = "🤔";
pub const DONE: &str = "💯";
pub const FAILED: &str = "🤯";
pub const UNRECOGNIZED: &str = "👎";

/// Turns raw message text into a command, runs it and posts the result.
pub struct CommandHandler {
    platform: Arc<dyn Platform>,
    config: Arc<BotConfig>,
    services: Services,
}

impl CommandHandler {
    pub fn new(platform: Arc<dyn Platform>, config: BotConfig) -> Self {
        let config = Arc::new(config);
        let allocator = Allocator::new(platform.clone(), config.tags.clone(), config.quota);
        Self {
            platform,
            services: Services::new(allocator, config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Handle one message. Messages outside the community, without the prefix, or
    /// starting with a banned prefix are ignored.
    ///
    /// An error is returned only after the failure reaction has been attempted.
    pub async fn handle(&self, context: CommandContext, content: &str) -> Result<()> {
        let invocation = match context {
            CommandContext::Direct => {
                log::debug!("Ignoring direct message");
                return Ok(());
            }
            CommandContext::Community(invocation) => invocation,
        };
        let Some(command) = content.strip_prefix(self.config.prefix.as_str()) else {
            return Ok(());
        };
        if let Some(ban) = self.config.banned_prefix_of(content) {
            log::debug!("Ignoring message with banned prefix {ban:?}");
            return Ok(());
        }

        let started = Instant::now();
        let mut words = command.split_whitespace();
        let word = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();
        log::info!(
            "Processing {command} from {} in {}",
            invocation.caller.display_name,
            invocation.channel
        );

        self.platform
            .react(invocation.channel, invocation.message, THINKING)
            .await
            .context("Failed to acknowledge command")?;
        let result = match CommandAction::parse(word, &self.config.sponsor_command()) {
            Some(action) => self.run(action, &args, &invocation).await.map(Some),
            None => Ok(None),
        };
        if let Err(err) = self
            .platform
            .remove_reaction(invocation.channel, invocation.message, THINKING)
            .await
        {
            log::warn!("Failed to clear acknowledgement: {err}");
        }

        match result {
            Ok(Some(action)) => {
                self.platform
                    .react(invocation.channel, invocation.message, DONE)
                    .await?;
                log::debug!(
                    "Finished {} from {} in {:?}",
                    action.as_str(),
                    invocation.caller.display_name,
                    started.elapsed()
                );
                Ok(())
            }
            Ok(None) => {
                self.platform
                    .send(
                        invocation.channel,
                        &format!(
                            "Unrecognized command! try {}help for a list of commands",
                            self.config.prefix
                        ),
                    )
                    .await?;
                self.platform
                    .react(invocation.channel, invocation.message, UNRECOGNIZED)
                    .await?;
                Ok(())
            }
            Err(err) => {
                if let Err(react_err) = self
                    .platform
                    .react(invocation.channel, invocation.message, FAILED)
                    .await
                {
                    log::warn!("Failed to flag command failure: {react_err}");
                }
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        action: CommandAction,
        args: &[&str],
        invocation: &Invocation,
    ) -> Result<CommandAction> {
        let outcome = self
            .services
            .route(action, args, invocation)
            .await
            .with_context(|| format!("{} failed", action.as_str()))?;
        for message in outcome.messages {
            self.platform
                .send(message.channel, &message.content)
                .await
                .with_context(|| format!("Failed to post reply to {}", message.channel))?;
        }
        Ok(action)
    }
}
