use crate::memory::MemoryPlatform;
use crate::snapshot::WorkspaceSnapshot;
use crate::types::{
    AccessGrant, Channel, ChannelId, ChannelKind, GrantTarget, Member, MemberId, Message,
    MessageId, Permissions, Tag, TagId, WorkspaceId,
};
use chrono::{Duration, Utc};

pub const WORKSPACE_ID: WorkspaceId = WorkspaceId(1);
pub const BOT_ID: MemberId = MemberId(2);

/// Incremental construction of a [`WorkspaceSnapshot`] for fixtures and demos.
pub struct WorkspaceBuilder {
    snapshot: WorkspaceSnapshot,
    next_id: u64,
}

impl WorkspaceBuilder {
    pub fn new(name: &str) -> Self {
        let mut snapshot = WorkspaceSnapshot::empty(WORKSPACE_ID, name, BOT_ID);
        snapshot.bot_permissions = Permissions::VIEW_CHANNEL
            | Permissions::SEND_MESSAGES
            | Permissions::MANAGE_MESSAGES
            | Permissions::MANAGE_CHANNELS
            | Permissions::MANAGE_ROLES
            | Permissions::ADD_REACTIONS
            | Permissions::READ_MESSAGE_HISTORY;
        Self {
            snapshot,
            next_id: 100,
        }
    }

    fn id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn bot_permissions(&mut self, permissions: Permissions) -> &mut Self {
        self.snapshot.bot_permissions = permissions;
        self
    }

    pub fn unique_container_names(&mut self) -> &mut Self {
        self.snapshot.unique_container_names = true;
        self
    }

    pub fn tag(&mut self, name: &str) -> TagId {
        let id = TagId(self.id());
        self.snapshot.tags.push(Tag {
            id,
            name: name.to_string(),
            mentionable: false,
            permissions: Permissions::empty(),
        });
        id
    }

    pub fn member(&mut self, display_name: &str, tags: &[TagId]) -> MemberId {
        let id = MemberId(self.id());
        self.snapshot.members.push(Member {
            id,
            display_name: display_name.to_string(),
            tags: tags.to_vec(),
            bot: false,
        });
        id
    }

    pub fn give_tag(&mut self, member: MemberId, tag: TagId) -> &mut Self {
        if let Some(m) = self.snapshot.members.iter_mut().find(|m| m.id == member) {
            if !m.tags.contains(&tag) {
                m.tags.push(tag);
            }
        }
        self
    }

    /// A container carrying an allow grant for each of `tags`.
    pub fn container(&mut self, name: &str, position: i64, tags: &[TagId]) -> ChannelId {
        let id = ChannelId(self.id());
        self.snapshot.channels.push(Channel {
            id,
            name: name.to_string(),
            kind: ChannelKind::Container,
            parent: None,
            position,
            grants: tags
                .iter()
                .map(|tag| AccessGrant::allow(GrantTarget::Tag(*tag), Permissions::VIEW_CHANNEL))
                .collect(),
        });
        id
    }

    fn push_text(&mut self, name: &str, parent: ChannelId, grants: Vec<AccessGrant>) -> ChannelId {
        let id = ChannelId(self.id());
        let position = self
            .snapshot
            .channels
            .iter()
            .filter(|c| c.parent == Some(parent))
            .count() as i64;
        self.snapshot.channels.push(Channel {
            id,
            name: name.to_string(),
            kind: ChannelKind::Text,
            parent: Some(parent),
            position,
            grants,
        });
        id
    }

    /// A text channel everyone can see.
    pub fn text_channel(&mut self, name: &str, parent: ChannelId) -> ChannelId {
        self.push_text(name, parent, Vec::new())
    }

    /// A private text space visible to `members` and `tags` only.
    pub fn space(
        &mut self,
        name: &str,
        parent: ChannelId,
        members: &[MemberId],
        tags: &[TagId],
    ) -> ChannelId {
        let access = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        let mut grants = vec![AccessGrant::deny(
            GrantTarget::Everyone,
            Permissions::VIEW_CHANNEL,
        )];
        grants.extend(
            members
                .iter()
                .map(|m| AccessGrant::allow(GrantTarget::Member(*m), access)),
        );
        grants.extend(
            tags.iter()
                .map(|t| AccessGrant::allow(GrantTarget::Tag(*t), access)),
        );
        self.push_text(name, parent, grants)
    }

    /// Top up `parent` with unowned filler spaces until it holds `count` children.
    pub fn fill(&mut self, parent: ChannelId, count: usize) -> &mut Self {
        let existing = self
            .snapshot
            .channels
            .iter()
            .filter(|c| c.parent == Some(parent))
            .count();
        for n in existing..count {
            self.space(&format!("filler-{n}"), parent, &[], &[]);
        }
        self
    }

    /// A message posted `age` ago.
    pub fn message(
        &mut self,
        channel: ChannelId,
        author: MemberId,
        content: &str,
        age: Duration,
    ) -> MessageId {
        let id = MessageId(self.id());
        self.snapshot.messages.push(Message {
            id,
            channel,
            author,
            content: content.to_string(),
            created_at: Utc::now() - age,
        });
        id
    }

    pub fn build(&self) -> WorkspaceSnapshot {
        self.snapshot.clone()
    }

    pub fn platform(&self) -> MemoryPlatform {
        MemoryPlatform::new(self.build())
    }
}
