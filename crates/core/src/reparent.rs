use crate::allocator::Allocator;
use crate::error::Result;
use crate::invocation::{Invocation, SpaceRequest};
use crate::ownership::is_owner;
use crate::placement::{place, Placement};
use sponsor_platform::{Channel, SpaceEdit};

#[derive(Debug)]
pub enum ReparentOutcome {
    TagMissing(String),
    /// The command was issued outside a managed space.
    NotManaged,
    NotOwner,
    UnknownFamily { known: Vec<String> },
    OutOfRoom { family: String },
    Moved { space: Channel, container: Channel },
}

impl Allocator {
    /// Move the space the command was issued in to `request.family` and rename it.
    pub async fn reparent(
        &self,
        invocation: &Invocation,
        request: &SpaceRequest,
    ) -> Result<ReparentOutcome> {
        if self.sponsor_tag().await?.is_none() {
            return Ok(ReparentOutcome::TagMissing(self.tags().sponsor.clone()));
        }

        let caller = &invocation.caller;
        let current = self.platform().channel(invocation.channel).await?;
        let index = self.families().await?;
        let managed = current
            .parent
            .is_some_and(|parent| index.is_instance(parent));
        if !managed {
            log::debug!("Requested to rename channel not in a managed family: {}", current.name);
            return Ok(ReparentOutcome::NotManaged);
        }
        if !is_owner(&current, caller.id) {
            log::debug!(
                "Non owner requested rename of unauthorized channel. {}, {}",
                caller.display_name,
                current.name
            );
            return Ok(ReparentOutcome::NotOwner);
        }
        if !index.contains_family(&request.family) {
            return Ok(ReparentOutcome::UnknownFamily { known: index.keys() });
        }

        let _guard = self.locks().lock(&request.family).await;
        let mut index = self.families().await?;
        index.forget_space(current.id);
        let placement = place(
            self.platform(),
            &self.tags().container,
            &index,
            &request.family,
        )
        .await?;
        let Some(container) = placement.container().cloned() else {
            return Ok(ReparentOutcome::OutOfRoom {
                family: request.family.clone(),
            });
        };
        if let Placement::Extended(created) = &placement {
            log::info!("Extended {} for rename of {}", created.name, current.name);
        }

        let space = self
            .platform()
            .edit_space(
                current.id,
                SpaceEdit {
                    parent: Some(container.id),
                    name: Some(request.space_name(caller)),
                },
            )
            .await?;
        log::info!("Renamed {} to {} in {}", current.name, space.name, container.name);
        Ok(ReparentOutcome::Moved { space, container })
    }
}
