mod audit;
mod drn;
mod find;
mod help;
mod init;
mod space;

use crate::command::domain::{CommandAction, CommandOutcome};
use crate::config::BotConfig;
use anyhow::Result;
use sponsor_core::{Allocator, Invocation};
use sponsor_platform::ChannelId;
use std::sync::Arc;

pub struct Services {
    audit: audit::AuditService,
    drn: drn::DrnService,
    find: find::FindService,
    help: help::HelpService,
    init: init::InitService,
    space: space::SpaceService,
}

impl Services {
    pub fn new(allocator: Allocator, config: Arc<BotConfig>) -> Self {
        Self {
            audit: audit::AuditService::new(allocator.clone()),
            drn: drn::DrnService::new(allocator.clone()),
            find: find::FindService::new(allocator.clone()),
            help: help::HelpService::new(allocator.clone(), config.clone()),
            init: init::InitService::new(allocator.clone()),
            space: space::SpaceService::new(allocator, config),
        }
    }

    pub async fn route(
        &self,
        action: CommandAction,
        args: &[&str],
        invocation: &Invocation,
    ) -> Result<CommandOutcome> {
        match action {
            CommandAction::Init => self.init.run(invocation).await,
            CommandAction::Sponsor => self.space.provision(args, invocation).await,
            CommandAction::Rename => self.space.rename(args, invocation).await,
            CommandAction::Find => self.find.run(invocation).await,
            CommandAction::Stales => self.audit.stales(args, invocation).await,
            CommandAction::FindSponsees => self.audit.unattended(invocation).await,
            CommandAction::BulkApplySponseeTag => self.audit.backfill(invocation).await,
            CommandAction::Drn => self.drn.run(args, invocation).await,
            CommandAction::Help => self.help.run(invocation).await,
        }
    }
}

fn tag_missing(channel: ChannelId, name: &str) -> CommandOutcome {
    CommandOutcome::reply(channel, format!("Server has no {name} role!"))
}

fn unknown_family(channel: ChannelId, known: &[String]) -> CommandOutcome {
    let quoted: Vec<String> = known.iter().map(|family| format!("\"{family}\"")).collect();
    CommandOutcome::reply(
        channel,
        format!(
            "Unrecognized family! Recognized families: {}",
            quoted.join(", ")
        ),
    )
}

fn out_of_room(channel: ChannelId, family: &str) -> CommandOutcome {
    CommandOutcome::reply(
        channel,
        format!("Out of room for {family}! Ask someone to make more!"),
    )
}

fn mentions<'a>(channels: impl IntoIterator<Item = &'a sponsor_platform::Channel>) -> Vec<String> {
    channels.into_iter().map(|channel| channel.mention()).collect()
}
