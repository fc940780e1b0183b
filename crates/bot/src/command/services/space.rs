use super::{mentions, out_of_room, tag_missing, unknown_family};
use crate::command::domain::CommandOutcome;
use crate::config::BotConfig;
use anyhow::Result;
use sponsor_core::{Allocator, Invocation, ProvisionOutcome, ReparentOutcome, SpaceRequest};
use std::sync::Arc;

/// Only the first `@name` is replaced by the owner's mention.
fn greet(template: &str, mention: &str) -> String {
    template.replacen("@name", mention, 1)
}

pub(crate) struct SpaceService {
    allocator: Allocator,
    config: Arc<BotConfig>,
}

impl SpaceService {
    pub fn new(allocator: Allocator, config: Arc<BotConfig>) -> Self {
        Self { allocator, config }
    }

    fn usage(&self, command: &str, invocation: &Invocation) -> CommandOutcome {
        CommandOutcome::reply(
            invocation.channel,
            format!(
                "Please format the request in `{}{command} <FAMILY> <NAME>`",
                self.config.prefix
            ),
        )
    }

    pub async fn provision(&self, args: &[&str], invocation: &Invocation) -> Result<CommandOutcome> {
        let channel = invocation.channel;
        let Some(request) = SpaceRequest::parse(args) else {
            return Ok(self.usage(&self.config.sponsor_command(), invocation));
        };

        Ok(match self.allocator.provision(invocation, &request).await? {
            ProvisionOutcome::OverQuota { owned } => CommandOutcome::reply(channel, "You are at capacity!")
                .then(channel, format!("Found: {}", mentions(&owned).join(" "))),
            ProvisionOutcome::TagMissing(name) => tag_missing(channel, &name),
            ProvisionOutcome::UnknownFamily { known } => unknown_family(channel, &known),
            ProvisionOutcome::OutOfRoom { family } => out_of_room(channel, &family),
            ProvisionOutcome::Created(created) => {
                let mut outcome =
                    CommandOutcome::reply(channel, format!("Created {}", created.space.mention()));
                if !self.config.greeting.trim().is_empty() {
                    let greeting = greet(&self.config.greeting, &invocation.caller.mention());
                    outcome = outcome.then(created.space.id, greeting);
                }
                outcome
            }
        })
    }

    pub async fn rename(&self, args: &[&str], invocation: &Invocation) -> Result<CommandOutcome> {
        let channel = invocation.channel;
        let Some(request) = SpaceRequest::parse(args) else {
            return Ok(self.usage("rename", invocation));
        };

        Ok(match self.allocator.reparent(invocation, &request).await? {
            ReparentOutcome::TagMissing(name) => tag_missing(channel, &name),
            ReparentOutcome::NotManaged => CommandOutcome::silent(),
            ReparentOutcome::NotOwner => {
                CommandOutcome::reply(channel, "Only channel owners may use this command")
            }
            ReparentOutcome::UnknownFamily { known } => unknown_family(channel, &known),
            ReparentOutcome::OutOfRoom { family } => out_of_room(channel, &family),
            ReparentOutcome::Moved { space, .. } => {
                CommandOutcome::reply(channel, format!("Renamed to {}", space.mention()))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_mentions_the_owner_once() {
        assert_eq!(
            greet("Hi @name! Ask @name-style questions.", "<@7>"),
            "Hi <@7>! Ask @name-style questions."
        );
        assert_eq!(greet("No placeholder", "<@7>"), "No placeholder");
    }
}
