use crate::allocator::Allocator;
use crate::error::Result;
use crate::invocation::{Invocation, SpaceRequest};
use crate::limits::LISTING_LIMIT;
use crate::ownership::owned_in;
use crate::placement::{place, Placement};
use sponsor_platform::{AccessGrant, Channel, GrantTarget, NewSpace, Permissions};

/// Access given to the owner and to sponsors on a managed space.
pub const SPACE_ACCESS: Permissions = Permissions(
    Permissions::VIEW_CHANNEL.0 | Permissions::MANAGE_MESSAGES.0 | Permissions::SEND_MESSAGES.0,
);

#[derive(Debug)]
pub struct Provisioned {
    pub space: Channel,
    pub container: Channel,
    /// The container was created to make room for this space.
    pub extended: bool,
    /// The caller received the sponsee tag. Failure here is not rolled back.
    pub sponsee_tagged: bool,
}

#[derive(Debug)]
pub enum ProvisionOutcome {
    OverQuota { owned: Vec<Channel> },
    TagMissing(String),
    UnknownFamily { known: Vec<String> },
    OutOfRoom { family: String },
    Created(Provisioned),
}

impl Allocator {
    /// Create a private space for the caller in `request.family`.
    pub async fn provision(
        &self,
        invocation: &Invocation,
        request: &SpaceRequest,
    ) -> Result<ProvisionOutcome> {
        let caller = &invocation.caller;
        let index = self.families().await?;
        let owned = owned_in(&index, caller.id, LISTING_LIMIT);
        if owned.len() > self.quota() {
            log::info!(
                "{} is at capacity ({} spaces, quota {})",
                caller.display_name,
                owned.len(),
                self.quota()
            );
            return Ok(ProvisionOutcome::OverQuota { owned });
        }

        let Some(sponsor) = self.sponsor_tag().await? else {
            return Ok(ProvisionOutcome::TagMissing(self.tags().sponsor.clone()));
        };
        let Some(sponsee) = self.sponsee_tag().await? else {
            return Ok(ProvisionOutcome::TagMissing(self.tags().sponsee.clone()));
        };
        if !index.contains_family(&request.family) {
            return Ok(ProvisionOutcome::UnknownFamily { known: index.keys() });
        }

        let guard = self.locks().lock(&request.family).await;
        let index = self.families().await?;
        let placement = place(
            self.platform(),
            &self.tags().container,
            &index,
            &request.family,
        )
        .await?;
        let (container, extended) = match placement {
            Placement::Existing(container) => (container, false),
            Placement::Extended(container) => (container, true),
            Placement::OutOfRoom => {
                return Ok(ProvisionOutcome::OutOfRoom {
                    family: request.family.clone(),
                })
            }
        };

        let space = self
            .platform()
            .create_space(NewSpace {
                name: request.space_name(caller),
                parent: container.id,
                grants: vec![
                    AccessGrant::deny(GrantTarget::Everyone, Permissions::VIEW_CHANNEL),
                    AccessGrant::allow(GrantTarget::Member(caller.id), SPACE_ACCESS),
                    AccessGrant::allow(GrantTarget::Tag(sponsor.id), SPACE_ACCESS),
                ],
            })
            .await?;
        drop(guard);
        log::info!("Created {} in {}", space.name, container.name);

        let sponsee_tagged = match self.platform().add_member_tag(caller.id, sponsee.id).await {
            Ok(()) => true,
            Err(err) => {
                log::warn!(
                    "Created {} but could not tag {} as {}: {err}",
                    space.name,
                    caller.display_name,
                    sponsee.name
                );
                false
            }
        };

        Ok(ProvisionOutcome::Created(Provisioned {
            space,
            container,
            extended,
            sponsee_tagged,
        }))
    }
}
