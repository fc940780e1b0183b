use super::tag_missing;
use crate::command::domain::CommandOutcome;
use crate::dice;
use anyhow::Result;
use sponsor_core::{holds_tag, is_owner, Allocator, Invocation};

pub(crate) struct DrnService {
    allocator: Allocator,
}

impl DrnService {
    pub fn new(allocator: Allocator) -> Self {
        Self { allocator }
    }

    /// Sponsors may roll anywhere; everyone else only in a space they own.
    pub async fn run(&self, args: &[&str], invocation: &Invocation) -> Result<CommandOutcome> {
        let channel = invocation.channel;
        let Some(sponsor) = self.allocator.sponsor_tag().await? else {
            return Ok(tag_missing(channel, &self.allocator.tags().sponsor));
        };
        if !holds_tag(&invocation.caller, &sponsor) {
            let here = self.allocator.platform().channel(channel).await?;
            if !is_owner(&here, invocation.caller.id) {
                log::info!(
                    "{} may not roll in {}",
                    invocation.caller.display_name,
                    here.name
                );
                return Ok(CommandOutcome::silent());
            }
        }

        let Some((attack, defence)) = dice::parse_matchup(&args.join(" ")) else {
            return Ok(CommandOutcome::reply(channel, "Unrecognized input"));
        };
        let matchup = dice::simulate(attack, defence, &mut rand::thread_rng());
        Ok(CommandOutcome::reply(channel, dice::render(&matchup)))
    }
}
