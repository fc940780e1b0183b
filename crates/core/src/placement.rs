use crate::error::Result;
use crate::extender::extend;
use crate::family::FamilyIndex;
use sponsor_platform::{Channel, Platform};

/// Where a new or moved space should be parented.
#[derive(Debug, Clone)]
pub enum Placement {
    /// An existing instance below the child cap.
    Existing(Channel),
    /// A freshly created instance.
    Extended(Channel),
    OutOfRoom,
}

impl Placement {
    pub fn container(&self) -> Option<&Channel> {
        match self {
            Self::Existing(container) | Self::Extended(container) => Some(container),
            Self::OutOfRoom => None,
        }
    }
}

/// First instance of `family` with room, otherwise a new instance from [`extend`].
///
/// Run under the family's lock so the capacity check and any extension are not
/// interleaved with another placement in the same family.
pub async fn place(
    platform: &dyn Platform,
    container_tag: &str,
    index: &FamilyIndex,
    family: &str,
) -> Result<Placement> {
    if let Some(instance) = index.first_with_room(family) {
        return Ok(Placement::Existing(instance.container.clone()));
    }
    Ok(match extend(platform, container_tag, family).await? {
        Some(container) => Placement::Extended(container),
        None => Placement::OutOfRoom,
    })
}
