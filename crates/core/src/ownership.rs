use crate::error::Result;
use crate::family::{find_families, FamilyIndex};
use crate::invocation::Invocation;
use sponsor_platform::{Channel, GrantTarget, MemberId, Platform, Tag};

/// A participant owns a space when the space carries an explicit grant keyed by them.
pub fn is_owner(space: &Channel, member: MemberId) -> bool {
    space.grant_for(GrantTarget::Member(member)).is_some()
}

/// Whose spaces a `find` looks up: the caller, or the single mentioned participant when
/// the caller holds the sponsor tag.
pub fn subject_of(invocation: &Invocation, sponsor: Option<&Tag>) -> MemberId {
    let is_sponsor = sponsor.is_some_and(|tag| invocation.caller.has_tag(tag.id));
    match invocation.mentions.as_slice() {
        [mentioned] if is_sponsor => *mentioned,
        _ => invocation.caller.id,
    }
}

/// Managed spaces owned by `subject`, in scan order, at most `limit`.
pub fn owned_in(index: &FamilyIndex, subject: MemberId, limit: usize) -> Vec<Channel> {
    index
        .spaces()
        .filter(|space| is_owner(space, subject))
        .take(limit)
        .cloned()
        .collect()
}

pub async fn find_owned(
    platform: &dyn Platform,
    container_tag: &str,
    subject: MemberId,
    limit: usize,
) -> Result<Vec<Channel>> {
    let index = find_families(platform, container_tag).await?;
    Ok(owned_in(&index, subject, limit))
}
