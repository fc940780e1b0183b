//! # Sponsor Platform
//!
//! The workspace-platform collaborator consumed by the sponsor bot.
//!
//! ## Contents
//!
//! - [`Platform`]: async CRUD primitives against one community workspace (tags,
//!   containers, spaces, access grants, message history, reactions)
//! - [`MemoryPlatform`]: an in-process implementation backed by a JSON
//!   [`WorkspaceSnapshot`], with injectable failures for error-path testing
//! - [`WorkspaceBuilder`]: fixture construction for tests and demo workspaces
//!
//! Connection handling, authentication and rate limiting belong to concrete
//! implementations; callers only see [`PlatformError`].

mod builder;
mod error;
mod memory;
mod platform;
mod snapshot;
mod types;

pub use builder::{WorkspaceBuilder, BOT_ID, WORKSPACE_ID};
pub use error::{PlatformError, Result};
pub use memory::{MemoryPlatform, Operation};
pub use platform::Platform;
pub use snapshot::{Reaction, WorkspaceSnapshot};
pub use types::{
    AccessGrant, Channel, ChannelId, ChannelKind, GrantTarget, Member, MemberId, Message,
    MessageId, NewContainer, NewSpace, Permissions, SpaceEdit, Tag, TagId, WorkspaceId,
    WorkspaceInfo,
};
