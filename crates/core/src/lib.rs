//! # Sponsor Core
//!
//! Capacity-constrained allocation of private sponsor/sponsee spaces inside a community
//! workspace, plus the lifecycle operations around them.
//!
//! ## Model
//!
//! Managed *containers* carry an access grant for the container tag and are grouped into
//! *families* by the lower-cased first token of their name (`"Alpha 1"`, `"alpha 2"` are
//! both family `alpha`). Each container holds at most [`SPACES_PER_CONTAINER`] spaces; a
//! full family is extended with the next numbered container, up to [`MAX_ORDINAL`].
//!
//! Nothing is cached: every operation re-derives the [`FamilyIndex`] from the
//! [`sponsor_platform::Platform`].
//!
//! ## Operations
//!
//! - [`Allocator::init`]: permission preflight and managed-tag creation
//! - [`Allocator::provision`]: create a space for the caller in a family
//! - [`find_owned`]: spaces a participant owns
//! - [`Allocator::reparent`]: move and rename a space
//! - [`Allocator::find_stales`], [`Allocator::find_unattended`]: audits
//! - [`Allocator::backfill_sponsee_tag`]: repair missing sponsee tags
//!
//! User-visible precondition failures are returned as outcome enums; only transient
//! platform failures surface as [`CoreError`].

mod allocator;
mod audit;
mod capability;
mod duration;
mod error;
mod extender;
mod family;
mod invocation;
mod limits;
mod locks;
mod ownership;
mod placement;
mod provision;
mod reparent;

pub use allocator::{Allocator, InitOutcome, REQUIRED_PERMISSIONS};
pub use audit::{Audit, Backfill, StaleReport};
pub use capability::{ensure_managed_tags, holds_tag, resolve_tag, InitReport, ManagedTag};
pub use duration::parse_duration;
pub use error::{CoreError, Result};
pub use extender::extend;
pub use family::{family_key, find_families, ordinal, ContainerInstance, FamilyIndex};
pub use invocation::{Invocation, SpaceRequest};
pub use limits::{
    TagNames, LISTING_LIMIT, MAX_ORDINAL, SPACES_PER_CONTAINER, UNATTENDED_LOOKBACK,
};
pub use locks::FamilyLocks;
pub use ownership::{find_owned, is_owner, owned_in, subject_of};
pub use placement::{place, Placement};
pub use provision::{ProvisionOutcome, Provisioned, SPACE_ACCESS};
pub use reparent::ReparentOutcome;
