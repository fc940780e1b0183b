use crate::error::{PlatformError, Result};
use crate::platform::Platform;
use crate::snapshot::{Reaction, WorkspaceSnapshot};
use crate::types::{
    AccessGrant, Channel, ChannelId, ChannelKind, GrantTarget, Member, MemberId, Message,
    MessageId, NewContainer, NewSpace, Permissions, SpaceEdit, Tag, TagId, WorkspaceInfo,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Platform operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Workspace,
    BotMember,
    Member,
    Tags,
    CreateTag,
    AddMemberTag,
    Channels,
    CreateContainer,
    CreateSpace,
    EditSpace,
    RecentMessages,
    Occupants,
    Send,
    React,
}

struct State {
    snapshot: WorkspaceSnapshot,
    next_id: u64,
    failures: HashSet<Operation>,
    racing_container: Option<Channel>,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check(&self, op: Operation) -> Result<()> {
        if self.failures.contains(&op) {
            return Err(PlatformError::Request(format!("injected failure: {op:?}")));
        }
        Ok(())
    }

    fn member(&self, id: MemberId) -> Result<&Member> {
        self.snapshot
            .members
            .iter()
            .find(|member| member.id == id)
            .ok_or_else(|| PlatformError::NotFound(format!("member {id}")))
    }

    fn channel(&self, id: ChannelId) -> Result<&Channel> {
        self.snapshot
            .channels
            .iter()
            .find(|channel| channel.id == id)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {id}")))
    }

    fn can_view(&self, member: &Member, channel: &Channel) -> bool {
        let mut perms = Permissions::VIEW_CHANNEL;
        for tag in &self.snapshot.tags {
            if member.has_tag(tag.id) {
                perms |= tag.permissions;
            }
        }
        let apply = |perms: Permissions, grant: &AccessGrant| {
            perms.difference(grant.deny) | grant.allow
        };
        if let Some(grant) = channel.grant_for(GrantTarget::Everyone) {
            perms = apply(perms, grant);
        }
        let mut tag_allow = Permissions::empty();
        let mut tag_deny = Permissions::empty();
        for grant in &channel.grants {
            if let GrantTarget::Tag(tag) = grant.target {
                if member.has_tag(tag) {
                    tag_allow |= grant.allow;
                    tag_deny |= grant.deny;
                }
            }
        }
        perms = perms.difference(tag_deny) | tag_allow;
        if let Some(grant) = channel.grant_for(GrantTarget::Member(member.id)) {
            perms = apply(perms, grant);
        }
        perms.contains(Permissions::VIEW_CHANNEL)
    }
}

/// In-process [`Platform`] backed by a [`WorkspaceSnapshot`].
///
/// Every call yields to the scheduler once before touching state so that concurrently
/// running commands interleave the way they would against a remote service.
pub struct MemoryPlatform {
    state: Mutex<State>,
}

impl MemoryPlatform {
    pub fn new(snapshot: WorkspaceSnapshot) -> Self {
        let next_id = snapshot.max_id().max(1_000) + 1;
        Self {
            state: Mutex::new(State {
                snapshot,
                next_id,
                failures: HashSet::new(),
                racing_container: None,
            }),
        }
    }

    /// Make every subsequent call of `op` fail until [`Self::clear_failures`].
    pub async fn fail_on(&self, op: Operation) {
        self.state.lock().await.failures.insert(op);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Let `container` appear just before the next `create_container` call takes effect,
    /// as if another writer won the race. The call then fails with a conflict.
    pub async fn race_container(&self, container: Channel) {
        self.state.lock().await.racing_container = Some(container);
    }

    pub async fn snapshot(&self) -> WorkspaceSnapshot {
        self.state.lock().await.snapshot.clone()
    }

    /// Messages the bot account has sent, oldest first.
    pub async fn sent_messages(&self) -> Vec<Message> {
        let state = self.state.lock().await;
        let bot = state.snapshot.bot;
        state
            .snapshot
            .messages
            .iter()
            .filter(|message| message.author == bot)
            .cloned()
            .collect()
    }

    /// Inject a message as if `author` had posted it.
    pub async fn post(&self, channel: ChannelId, author: MemberId, content: &str) -> MessageId {
        let mut state = self.state.lock().await;
        let id = MessageId(state.allocate_id());
        state.snapshot.messages.push(Message {
            id,
            channel,
            author,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        id
    }

    async fn enter(&self, op: Operation) -> Result<tokio::sync::MutexGuard<'_, State>> {
        tokio::task::yield_now().await;
        let state = self.state.lock().await;
        state.check(op)?;
        Ok(state)
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    async fn workspace(&self) -> Result<WorkspaceInfo> {
        let state = self.enter(Operation::Workspace).await?;
        Ok(state.snapshot.workspace.clone())
    }

    async fn bot_member(&self) -> Result<Member> {
        let state = self.enter(Operation::BotMember).await?;
        state.member(state.snapshot.bot).cloned()
    }

    async fn bot_permissions(&self) -> Result<Permissions> {
        let state = self.enter(Operation::BotMember).await?;
        let bot = state.member(state.snapshot.bot)?;
        let mut perms = state.snapshot.bot_permissions;
        for tag in &state.snapshot.tags {
            if bot.has_tag(tag.id) {
                perms |= tag.permissions;
            }
        }
        Ok(perms)
    }

    async fn member(&self, id: MemberId) -> Result<Member> {
        let state = self.enter(Operation::Member).await?;
        state.member(id).cloned()
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        let state = self.enter(Operation::Tags).await?;
        Ok(state.snapshot.tags.clone())
    }

    async fn create_tag(&self, name: &str, mentionable: bool) -> Result<Tag> {
        let mut state = self.enter(Operation::CreateTag).await?;
        let tag = Tag {
            id: TagId(state.allocate_id()),
            name: name.to_string(),
            mentionable,
            permissions: Permissions::empty(),
        };
        state.snapshot.tags.push(tag.clone());
        Ok(tag)
    }

    async fn add_member_tag(&self, member: MemberId, tag: TagId) -> Result<()> {
        let mut state = self.enter(Operation::AddMemberTag).await?;
        if !state.snapshot.tags.iter().any(|t| t.id == tag) {
            return Err(PlatformError::NotFound(format!("tag {tag}")));
        }
        let member = state
            .snapshot
            .members
            .iter_mut()
            .find(|m| m.id == member)
            .ok_or_else(|| PlatformError::NotFound(format!("member {member}")))?;
        if !member.tags.contains(&tag) {
            member.tags.push(tag);
        }
        Ok(())
    }

    async fn channels(&self) -> Result<Vec<Channel>> {
        let state = self.enter(Operation::Channels).await?;
        Ok(state.snapshot.channels.clone())
    }

    async fn channel(&self, id: ChannelId) -> Result<Channel> {
        let state = self.enter(Operation::Channels).await?;
        state.channel(id).cloned()
    }

    async fn create_container(&self, spec: NewContainer) -> Result<Channel> {
        let mut state = self.enter(Operation::CreateContainer).await?;
        if let Some(racer) = state.racing_container.take() {
            let name = racer.name.clone();
            state.snapshot.channels.push(racer);
            return Err(PlatformError::Conflict(name));
        }
        if state.snapshot.unique_container_names
            && state
                .snapshot
                .channels
                .iter()
                .any(|c| c.is_container() && c.name.eq_ignore_ascii_case(&spec.name))
        {
            return Err(PlatformError::Conflict(spec.name));
        }
        for channel in state.snapshot.channels.iter_mut() {
            if channel.is_container() && channel.position >= spec.position {
                channel.position += 1;
            }
        }
        let channel = Channel {
            id: ChannelId(state.allocate_id()),
            name: spec.name,
            kind: ChannelKind::Container,
            parent: None,
            position: spec.position,
            grants: spec.grants,
        };
        state.snapshot.channels.push(channel.clone());
        Ok(channel)
    }

    async fn create_space(&self, spec: NewSpace) -> Result<Channel> {
        let mut state = self.enter(Operation::CreateSpace).await?;
        if !state.channel(spec.parent)?.is_container() {
            return Err(PlatformError::Request(format!(
                "parent {} is not a container",
                spec.parent
            )));
        }
        let position = state
            .snapshot
            .channels
            .iter()
            .filter(|c| c.parent == Some(spec.parent))
            .count() as i64;
        let channel = Channel {
            id: ChannelId(state.allocate_id()),
            name: spec.name,
            kind: ChannelKind::Text,
            parent: Some(spec.parent),
            position,
            grants: spec.grants,
        };
        state.snapshot.channels.push(channel.clone());
        Ok(channel)
    }

    async fn edit_space(&self, id: ChannelId, edit: SpaceEdit) -> Result<Channel> {
        let mut state = self.enter(Operation::EditSpace).await?;
        if let Some(parent) = edit.parent {
            if !state.channel(parent)?.is_container() {
                return Err(PlatformError::Request(format!(
                    "parent {parent} is not a container"
                )));
            }
        }
        let channel = state
            .snapshot
            .channels
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PlatformError::NotFound(format!("channel {id}")))?;
        if let Some(parent) = edit.parent {
            channel.parent = Some(parent);
        }
        if let Some(name) = edit.name {
            channel.name = name;
        }
        Ok(channel.clone())
    }

    async fn recent_messages(&self, channel: ChannelId, limit: usize) -> Result<Vec<Message>> {
        let state = self.enter(Operation::RecentMessages).await?;
        state.channel(channel)?;
        let mut messages: Vec<Message> = state
            .snapshot
            .messages
            .iter()
            .filter(|message| message.channel == channel)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn occupants(&self, channel: ChannelId) -> Result<Vec<Member>> {
        let state = self.enter(Operation::Occupants).await?;
        let channel = state.channel(channel)?;
        Ok(state
            .snapshot
            .members
            .iter()
            .filter(|member| state.can_view(member, channel))
            .cloned()
            .collect())
    }

    async fn send(&self, channel: ChannelId, content: &str) -> Result<MessageId> {
        let mut state = self.enter(Operation::Send).await?;
        state.channel(channel)?;
        let id = MessageId(state.allocate_id());
        let author = state.snapshot.bot;
        state.snapshot.messages.push(Message {
            id,
            channel,
            author,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        let mut state = self.enter(Operation::React).await?;
        let reaction = Reaction {
            channel,
            message,
            emoji: emoji.to_string(),
        };
        if !state.snapshot.reactions.contains(&reaction) {
            state.snapshot.reactions.push(reaction);
        }
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        emoji: &str,
    ) -> Result<()> {
        let mut state = self.enter(Operation::React).await?;
        state
            .snapshot
            .reactions
            .retain(|r| !(r.channel == channel && r.message == message && r.emoji == emoji));
        Ok(())
    }
}
