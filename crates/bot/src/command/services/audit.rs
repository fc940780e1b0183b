use super::{mentions, tag_missing};
use crate::command::domain::CommandOutcome;
use anyhow::Result;
use sponsor_core::{Allocator, Audit, CoreError, Invocation};

pub(crate) struct AuditService {
    allocator: Allocator,
}

impl AuditService {
    pub fn new(allocator: Allocator) -> Self {
        Self { allocator }
    }

    pub async fn stales(&self, args: &[&str], invocation: &Invocation) -> Result<CommandOutcome> {
        let channel = invocation.channel;
        let window = args.join(" ");
        let report = match self.allocator.find_stales(&invocation.caller, &window).await {
            Ok(Audit::Done(report)) => report,
            Ok(Audit::TagMissing(name)) => return Ok(tag_missing(channel, &name)),
            Ok(Audit::NotPermitted) => return Ok(CommandOutcome::silent()),
            Err(CoreError::InvalidDuration(message)) => {
                return Ok(CommandOutcome::reply(channel, message));
            }
            Err(err) => return Err(err.into()),
        };

        if report.is_empty() {
            return Ok(CommandOutcome::reply(channel, "No stale channels found"));
        }
        let mut outcome = CommandOutcome::silent();
        if !report.abandoned.is_empty() {
            outcome = outcome.then(
                channel,
                format!(
                    "Only {}:\n{}",
                    report.sponsor.name,
                    mentions(&report.abandoned).join("\n")
                ),
            );
        }
        if let (false, Some(since)) = (report.idle.is_empty(), report.idle_since) {
            outcome = outcome.then(
                channel,
                format!(
                    "Idle since {}:\n{}",
                    since.format("%Y-%m-%d %H:%M"),
                    mentions(&report.idle).join("\n")
                ),
            );
        }
        Ok(outcome)
    }

    pub async fn unattended(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        let channel = invocation.channel;
        Ok(match self.allocator.find_unattended(&invocation.caller).await? {
            Audit::Done(found) => CommandOutcome::reply(
                channel,
                format!("Found {} channels\n{}", found.len(), mentions(&found).join("\n")),
            ),
            Audit::TagMissing(name) => tag_missing(channel, &name),
            Audit::NotPermitted => CommandOutcome::silent(),
        })
    }

    pub async fn backfill(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        let channel = invocation.channel;
        Ok(match self.allocator.backfill_sponsee_tag(&invocation.caller).await? {
            Audit::Done(backfill) => CommandOutcome::reply(
                channel,
                format!(
                    "Added {} to {} users",
                    backfill.sponsee.mention(),
                    backfill.tagged
                ),
            ),
            Audit::TagMissing(name) => tag_missing(channel, &name),
            Audit::NotPermitted => CommandOutcome::silent(),
        })
    }
}
