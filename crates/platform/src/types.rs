use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

macro_rules! snowflake {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(WorkspaceId);
snowflake!(ChannelId);
snowflake!(MemberId);
snowflake!(TagId);
snowflake!(MessageId);

/// Permission bit set, applied through [`AccessGrant`]s or carried by tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const VIEW_CHANNEL: Self = Self(1 << 10);
    pub const SEND_MESSAGES: Self = Self(1 << 11);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const READ_MESSAGE_HISTORY: Self = Self(1 << 16);
    pub const ADD_REACTIONS: Self = Self(1 << 6);
    pub const MANAGE_CHANNELS: Self = Self(1 << 4);
    pub const MANAGE_ROLES: Self = Self(1 << 28);

    const NAMED: &'static [(&'static str, Permissions)] = &[
        ("MANAGE_CHANNELS", Self::MANAGE_CHANNELS),
        ("ADD_REACTIONS", Self::ADD_REACTIONS),
        ("VIEW_CHANNEL", Self::VIEW_CHANNEL),
        ("SEND_MESSAGES", Self::SEND_MESSAGES),
        ("MANAGE_MESSAGES", Self::MANAGE_MESSAGES),
        ("READ_MESSAGE_HISTORY", Self::READ_MESSAGE_HISTORY),
        ("MANAGE_ROLES", Self::MANAGE_ROLES),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Names of the known flags set in `self`, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Identity an [`AccessGrant`] is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum GrantTarget {
    /// The workspace-wide default identity.
    Everyone,
    Tag(TagId),
    Member(MemberId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub target: GrantTarget,
    #[serde(default)]
    pub allow: Permissions,
    #[serde(default)]
    pub deny: Permissions,
}

impl AccessGrant {
    pub fn allow(target: GrantTarget, allow: Permissions) -> Self {
        Self {
            target,
            allow,
            deny: Permissions::empty(),
        }
    }

    pub fn deny(target: GrantTarget, deny: Permissions) -> Self {
        Self {
            target,
            allow: Permissions::empty(),
            deny,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Container,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
    #[serde(default)]
    pub parent: Option<ChannelId>,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub grants: Vec<AccessGrant>,
}

impl Channel {
    pub fn is_container(&self) -> bool {
        self.kind == ChannelKind::Container
    }

    pub fn grant_for(&self, target: GrantTarget) -> Option<&AccessGrant> {
        self.grants.iter().find(|grant| grant.target == target)
    }

    /// Chat mention, e.g. `<#42>`.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub mentionable: bool,
    #[serde(default)]
    pub permissions: Permissions,
}

impl Tag {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
    #[serde(default)]
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub bot: bool,
}

impl Member {
    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel: ChannelId,
    pub author: MemberId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: WorkspaceId,
    pub name: String,
}

/// Initial shape of a container created by [`crate::Platform::create_container`].
#[derive(Debug, Clone)]
pub struct NewContainer {
    pub name: String,
    pub position: i64,
    pub grants: Vec<AccessGrant>,
}

/// Initial shape of a space created by [`crate::Platform::create_space`].
#[derive(Debug, Clone)]
pub struct NewSpace {
    pub name: String,
    pub parent: ChannelId,
    pub grants: Vec<AccessGrant>,
}

#[derive(Debug, Clone, Default)]
pub struct SpaceEdit {
    pub parent: Option<ChannelId>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_names_follow_bit_order() {
        let perms = Permissions::SEND_MESSAGES | Permissions::MANAGE_ROLES | Permissions::VIEW_CHANNEL;
        assert_eq!(
            perms.names(),
            vec!["VIEW_CHANNEL", "SEND_MESSAGES", "MANAGE_ROLES"]
        );
    }

    #[test]
    fn difference_removes_granted_bits() {
        let required = Permissions::VIEW_CHANNEL | Permissions::MANAGE_CHANNELS;
        let missing = required.difference(Permissions::VIEW_CHANNEL);
        assert_eq!(missing, Permissions::MANAGE_CHANNELS);
        assert!(required.difference(required).is_empty());
    }

    #[test]
    fn grant_target_serializes_tagged() {
        let raw = serde_json::to_string(&GrantTarget::Tag(TagId(7))).expect("serialize");
        assert_eq!(raw, r#"{"kind":"tag","id":7}"#);
        let everyone: GrantTarget =
            serde_json::from_str(r#"{"kind":"everyone"}"#).expect("deserialize");
        assert_eq!(everyone, GrantTarget::Everyone);
    }
}
