use crate::error::Result;
use crate::types::{
    Channel, ChannelId, Member, MemberId, Message, MessageId, Permissions, Tag, WorkspaceId,
    WorkspaceInfo,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub channel: ChannelId,
    pub message: MessageId,
    pub emoji: String,
}

/// Serializable state of a whole workspace, as seen by [`crate::MemoryPlatform`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub workspace: WorkspaceInfo,
    /// Account the bot runs as; must be listed in `members`.
    pub bot: MemberId,
    #[serde(default)]
    pub bot_permissions: Permissions,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    /// Reject container creation when a container with the same name exists.
    #[serde(default)]
    pub unique_container_names: bool,
}

impl WorkspaceSnapshot {
    /// A workspace containing only the bot account.
    pub fn empty(id: WorkspaceId, name: &str, bot: MemberId) -> Self {
        Self {
            workspace: WorkspaceInfo {
                id,
                name: name.to_string(),
            },
            bot,
            bot_permissions: Permissions::empty(),
            members: vec![Member {
                id: bot,
                display_name: "sponsor-bot".to_string(),
                tags: vec![],
                bot: true,
            }],
            tags: vec![],
            channels: vec![],
            messages: vec![],
            reactions: vec![],
            unique_container_names: false,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub(crate) fn max_id(&self) -> u64 {
        let ids = std::iter::once(self.workspace.id.0)
            .chain(self.members.iter().map(|m| m.id.0))
            .chain(self.tags.iter().map(|t| t.id.0))
            .chain(self.channels.iter().map(|c| c.id.0))
            .chain(self.messages.iter().map(|m| m.id.0));
        ids.max().unwrap_or(0)
    }
}
