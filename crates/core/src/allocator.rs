use crate::capability::{ensure_managed_tags, resolve_tag, InitReport};
use crate::error::Result;
use crate::family::{find_families, FamilyIndex};
use crate::limits::TagNames;
use crate::locks::FamilyLocks;
use sponsor_platform::{Permissions, Platform, Tag};
use std::sync::Arc;

/// Permissions the bot account needs at workspace level.
pub const REQUIRED_PERMISSIONS: Permissions = Permissions(
    Permissions::VIEW_CHANNEL.0
        | Permissions::SEND_MESSAGES.0
        | Permissions::MANAGE_MESSAGES.0
        | Permissions::MANAGE_CHANNELS.0
        | Permissions::MANAGE_ROLES.0
        | Permissions::ADD_REACTIONS.0
        | Permissions::READ_MESSAGE_HISTORY.0,
);

#[derive(Debug)]
pub enum InitOutcome {
    MissingPermissions(Permissions),
    Initialized { workspace: String, report: InitReport },
    Unchanged,
}

/// Entry point to the allocation and lifecycle operations of one workspace.
///
/// Holds no workspace state: every operation re-derives what it needs from the
/// platform. The only shared state is the per-family lock table.
#[derive(Clone)]
pub struct Allocator {
    platform: Arc<dyn Platform>,
    tags: TagNames,
    quota: usize,
    locks: FamilyLocks,
}

impl Allocator {
    pub fn new(platform: Arc<dyn Platform>, tags: TagNames, quota: usize) -> Self {
        Self {
            platform,
            tags,
            quota,
            locks: FamilyLocks::new(),
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn tags(&self) -> &TagNames {
        &self.tags
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    pub(crate) fn locks(&self) -> &FamilyLocks {
        &self.locks
    }

    pub async fn families(&self) -> Result<FamilyIndex> {
        find_families(self.platform(), &self.tags.container).await
    }

    pub async fn sponsor_tag(&self) -> Result<Option<Tag>> {
        resolve_tag(self.platform(), &self.tags.sponsor).await
    }

    pub async fn sponsee_tag(&self) -> Result<Option<Tag>> {
        resolve_tag(self.platform(), &self.tags.sponsee).await
    }

    /// Check the bot's permissions, then create any missing managed tag.
    pub async fn init(&self) -> Result<InitOutcome> {
        let granted = self.platform.bot_permissions().await?;
        let missing = REQUIRED_PERMISSIONS.difference(granted);
        if !missing.is_empty() {
            log::warn!("Missing permissions: {:?}", missing.names());
            return Ok(InitOutcome::MissingPermissions(missing));
        }

        let workspace = self.platform.workspace().await?;
        log::info!("Initializing {}", workspace.name);
        let report = ensure_managed_tags(self.platform(), &self.tags).await?;
        if report.changed() {
            log::info!("Initialized {}", workspace.name);
            Ok(InitOutcome::Initialized {
                workspace: workspace.name,
                report,
            })
        } else {
            Ok(InitOutcome::Unchanged)
        }
    }
}
