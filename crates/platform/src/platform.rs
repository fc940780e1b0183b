use crate::error::Result;
use crate::types::{
    Channel, ChannelId, Member, MemberId, Message, MessageId, NewContainer, NewSpace,
    Permissions, SpaceEdit, Tag, TagId, WorkspaceInfo,
};
use async_trait::async_trait;

/// CRUD primitives against one community workspace.
///
/// Implementations own connection, authentication and rate limiting. Every call is a
/// live query; callers must not assume two calls observe the same state.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn workspace(&self) -> Result<WorkspaceInfo>;

    /// The account the bot runs as.
    async fn bot_member(&self) -> Result<Member>;

    /// Effective workspace-level permissions of the bot account.
    async fn bot_permissions(&self) -> Result<Permissions>;

    async fn member(&self, id: MemberId) -> Result<Member>;

    async fn tags(&self) -> Result<Vec<Tag>>;

    async fn create_tag(&self, name: &str, mentionable: bool) -> Result<Tag>;

    async fn add_member_tag(&self, member: MemberId, tag: TagId) -> Result<()>;

    /// All channels of the workspace, in platform iteration order.
    async fn channels(&self) -> Result<Vec<Channel>>;

    async fn channel(&self, id: ChannelId) -> Result<Channel>;

    async fn create_container(&self, spec: NewContainer) -> Result<Channel>;

    async fn create_space(&self, spec: NewSpace) -> Result<Channel>;

    async fn edit_space(&self, id: ChannelId, edit: SpaceEdit) -> Result<Channel>;

    /// Newest-first, at most `limit` messages.
    async fn recent_messages(&self, channel: ChannelId, limit: usize) -> Result<Vec<Message>>;

    /// Members able to view `channel`.
    async fn occupants(&self, channel: ChannelId) -> Result<Vec<Member>>;

    async fn send(&self, channel: ChannelId, content: &str) -> Result<MessageId>;

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()>;

    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<()>;
}
