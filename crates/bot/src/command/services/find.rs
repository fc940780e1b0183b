use super::mentions;
use crate::command::domain::CommandOutcome;
use anyhow::Result;
use sponsor_core::{find_owned, subject_of, Allocator, Invocation, LISTING_LIMIT};

pub(crate) struct FindService {
    allocator: Allocator,
}

impl FindService {
    pub fn new(allocator: Allocator) -> Self {
        Self { allocator }
    }

    pub async fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        let sponsor = self.allocator.sponsor_tag().await?;
        let subject = subject_of(invocation, sponsor.as_ref());
        let found = find_owned(
            self.allocator.platform(),
            &self.allocator.tags().container,
            subject,
            LISTING_LIMIT,
        )
        .await?;
        Ok(CommandOutcome::reply(
            invocation.channel,
            format!("Found: {}", mentions(&found).join(" ")),
        ))
    }
}
