use crate::capability::resolve_tag;
use crate::error::Result;
use crate::limits::SPACES_PER_CONTAINER;
use sponsor_platform::{Channel, ChannelId, GrantTarget, Platform, TagId};
use std::collections::BTreeMap;

/// Family key of a container name: its first whitespace-delimited token, lower-cased.
pub fn family_key(name: &str) -> String {
    name.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Numeric suffix of `"<family> <ordinal>"`, if the name has one.
pub fn ordinal(name: &str) -> Option<u32> {
    let mut tokens = name.split_whitespace();
    tokens.next()?;
    tokens.next()?.parse().ok()
}

/// A managed container together with the spaces currently parented to it.
#[derive(Debug, Clone)]
pub struct ContainerInstance {
    pub container: Channel,
    pub children: Vec<Channel>,
}

impl ContainerInstance {
    pub fn id(&self) -> ChannelId {
        self.container.id
    }

    pub fn has_room(&self) -> bool {
        self.children.len() < SPACES_PER_CONTAINER
    }
}

/// Managed containers grouped by family key.
///
/// Keys iterate in sorted order. Instances within a family keep platform iteration
/// order, which is not necessarily ordinal order.
#[derive(Debug, Clone, Default)]
pub struct FamilyIndex {
    families: BTreeMap<String, Vec<ContainerInstance>>,
}

impl FamilyIndex {
    /// Group every container carrying a grant for `container_tag`.
    pub fn from_channels(channels: &[Channel], container_tag: TagId) -> Self {
        let mut families: BTreeMap<String, Vec<ContainerInstance>> = BTreeMap::new();
        for channel in channels {
            if !channel.is_container()
                || channel.grant_for(GrantTarget::Tag(container_tag)).is_none()
            {
                continue;
            }
            let children = channels
                .iter()
                .filter(|child| !child.is_container() && child.parent == Some(channel.id))
                .cloned()
                .collect();
            families
                .entry(family_key(&channel.name))
                .or_default()
                .push(ContainerInstance {
                    container: channel.clone(),
                    children,
                });
        }
        Self { families }
    }

    pub fn get(&self, family: &str) -> Option<&[ContainerInstance]> {
        self.families.get(family).map(Vec::as_slice)
    }

    pub fn contains_family(&self, family: &str) -> bool {
        self.families.contains_key(family)
    }

    pub fn keys(&self) -> Vec<String> {
        self.families.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn instances(&self) -> impl Iterator<Item = &ContainerInstance> {
        self.families.values().flatten()
    }

    /// Every managed space, family by family, instance by instance.
    pub fn spaces(&self) -> impl Iterator<Item = &Channel> {
        self.instances().flat_map(|instance| instance.children.iter())
    }

    pub fn is_instance(&self, container: ChannelId) -> bool {
        self.instances().any(|instance| instance.id() == container)
    }

    /// Drop `space` from its instance's children, so that a space being moved does not
    /// count against the container it already occupies.
    pub fn forget_space(&mut self, space: ChannelId) {
        for instance in self.families.values_mut().flatten() {
            instance.children.retain(|child| child.id != space);
        }
    }

    /// First instance of `family`, in list order, below the per-container cap.
    pub fn first_with_room(&self, family: &str) -> Option<&ContainerInstance> {
        self.get(family)?.iter().find(|instance| instance.has_room())
    }
}

/// Scan the workspace for managed containers. Empty when the container tag is missing.
pub async fn find_families(platform: &dyn Platform, container_tag: &str) -> Result<FamilyIndex> {
    let Some(tag) = resolve_tag(platform, container_tag).await? else {
        log::debug!("No {container_tag:?} tag; no managed families");
        return Ok(FamilyIndex::default());
    };
    let channels = platform.channels().await?;
    Ok(FamilyIndex::from_channels(&channels, tag.id))
}
