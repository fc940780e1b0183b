use crate::command::domain::CommandOutcome;
use crate::config::BotConfig;
use anyhow::Result;
use sponsor_core::{Allocator, Invocation};
use std::sync::Arc;

pub(crate) struct HelpService {
    allocator: Allocator,
    config: Arc<BotConfig>,
}

impl HelpService {
    pub fn new(allocator: Allocator, config: Arc<BotConfig>) -> Self {
        Self { allocator, config }
    }

    pub async fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        let prefix = &self.config.prefix;
        let sponsor_name = &self.config.tags.sponsor;
        let command = self.config.sponsor_command();

        let mut lines = vec![
            "Commands".to_string(),
            "```".to_string(),
            format!("{prefix}{command} <family> <name> -- create a {command} channel for yourself"),
            format!(
                "{prefix}rename <family> <name> -- rename your {command} channel (must be done within your {command} channel)"
            ),
            format!(
                "{prefix}drn <number> vs <number> -- generate stats for an opposed 2drn vs 2drn check (only works in your {command} channel)"
            ),
            format!("{prefix}find -- find your channel"),
        ];
        let is_sponsor = self
            .allocator
            .sponsor_tag()
            .await?
            .is_some_and(|tag| invocation.caller.has_tag(tag.id));
        if is_sponsor {
            lines.extend([
                format!(
                    "[{sponsor_name} only] {prefix}findsponsees -- find {command} channel(s) where a {sponsor_name} hasn't talked in the last five messages"
                ),
                format!("[{sponsor_name} only] {prefix}find <@user> -- find {command} channel(s) for a user"),
                format!("[{sponsor_name} only] {prefix}stales <optional time: 1d12h, 30m, 45s> -- limit 50 channels (time needs a d/h/m/s unit)"),
                format!(
                    "[{sponsor_name} only] {prefix}bulkapplysponseetag -- give every sponsee in a {command} channel the {} role",
                    self.config.tags.sponsee
                ),
            ]);
        }
        lines.push("```".to_string());
        Ok(CommandOutcome::reply(invocation.channel, lines.join("\n")))
    }
}
