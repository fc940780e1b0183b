use crate::command::domain::CommandOutcome;
use anyhow::Result;
use sponsor_core::{holds_tag, Allocator, InitOutcome, Invocation};

pub(crate) struct InitService {
    allocator: Allocator,
}

impl InitService {
    pub fn new(allocator: Allocator) -> Self {
        Self { allocator }
    }

    pub async fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        let channel = invocation.channel;
        match self.allocator.init().await? {
            InitOutcome::MissingPermissions(missing) => Ok(CommandOutcome::reply(
                channel,
                format!("Missing permissions!\n{}", missing.names().join("\n")),
            )),
            InitOutcome::Initialized { workspace, report } => {
                let mut outcome = CommandOutcome::silent();
                for (kind, tag) in &report.created {
                    outcome = outcome.then(
                        channel,
                        format!("Created {} as {}", tag.mention(), kind.role()),
                    );
                }
                Ok(outcome.then(channel, format!("Initialized {workspace}")))
            }
            InitOutcome::Unchanged => {
                let sponsor = self.allocator.sponsor_tag().await?;
                let is_sponsor = sponsor
                    .as_ref()
                    .is_some_and(|tag| holds_tag(&invocation.caller, tag));
                if is_sponsor {
                    Ok(CommandOutcome::reply(channel, "Already initialized"))
                } else {
                    Ok(CommandOutcome::silent())
                }
            }
        }
    }
}
