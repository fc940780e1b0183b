use crate::capability::resolve_tag;
use crate::error::Result;
use crate::limits::MAX_ORDINAL;
use sponsor_platform::{AccessGrant, Channel, GrantTarget, NewContainer, Permissions, Platform};

fn find_numbered<'a>(channels: &'a [Channel], family: &str, ordinal: u32) -> Option<&'a Channel> {
    let wanted = format!("{family} {ordinal}");
    channels
        .iter()
        .find(|channel| channel.is_container() && channel.name.to_lowercase() == wanted)
}

/// Add the next numbered container to an already-seeded family.
///
/// Returns `None` when the container tag is missing, when `"<family> 1"` does not exist,
/// or when the family already reaches [`MAX_ORDINAL`]. Callers serialize invocations per
/// family with [`crate::FamilyLocks`]; a name conflict reported by the platform is
/// resolved by adopting the container another writer created.
pub async fn extend(
    platform: &dyn Platform,
    container_tag: &str,
    family: &str,
) -> Result<Option<Channel>> {
    log::info!("Extending {family}");
    let Some(tag) = resolve_tag(platform, container_tag).await? else {
        log::warn!("Cannot extend {family}: no {container_tag:?} tag");
        return Ok(None);
    };
    let family = family.to_lowercase();
    let channels = platform.channels().await?;

    let Some(mut last) = find_numbered(&channels, &family, 1) else {
        log::debug!("Family {family} has no first instance; not extending");
        return Ok(None);
    };
    let mut highest = 1;
    while let Some(next) = find_numbered(&channels, &family, highest + 1) {
        last = next;
        highest += 1;
    }
    if highest >= MAX_ORDINAL {
        log::warn!("Family {family} is at its ceiling of {MAX_ORDINAL} instances");
        return Ok(None);
    }

    let leading = last
        .name
        .split_whitespace()
        .next()
        .unwrap_or(family.as_str());
    let next = highest + 1;
    let spec = NewContainer {
        name: format!("{leading} {next}"),
        position: last.position + 1,
        grants: vec![AccessGrant::allow(
            GrantTarget::Tag(tag.id),
            Permissions::VIEW_CHANNEL,
        )],
    };

    match platform.create_container(spec).await {
        Ok(created) => {
            log::info!("Created {} at position {}", created.name, created.position);
            Ok(Some(created))
        }
        Err(err) if err.is_conflict() => {
            log::info!("{family} {next} was created concurrently; adopting it");
            let channels = platform.channels().await?;
            match find_numbered(&channels, &family, next) {
                Some(existing) => Ok(Some(existing.clone())),
                None => Err(err.into()),
            }
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sponsor_platform::{ChannelId, ChannelKind, WorkspaceBuilder, WorkspaceSnapshot};

    const TAG: &str = "Sponsor Channel";

    #[tokio::test]
    async fn appends_after_highest_instance() {
        let mut ws = WorkspaceBuilder::new("Guild");
        let tag = ws.tag(TAG);
        ws.container("Alpha 1", 4, &[tag]);
        ws.container("Alpha 2", 5, &[tag]);
        let platform = ws.platform();

        let created = extend(&platform, TAG, "alpha")
            .await
            .expect("extend")
            .expect("created");
        assert_eq!(created.name, "Alpha 3");
        assert_eq!(created.position, 6);
        assert!(created.grant_for(GrantTarget::Tag(tag)).is_some());
        assert_eq!(created.grants.len(), 1);
    }

    #[tokio::test]
    async fn unseeded_family_is_not_bootstrapped() {
        let mut ws = WorkspaceBuilder::new("Guild");
        let tag = ws.tag(TAG);
        ws.container("alpha 2", 0, &[tag]);
        let platform = ws.platform();

        assert!(extend(&platform, TAG, "alpha").await.expect("extend").is_none());
        assert!(extend(&platform, TAG, "gamma").await.expect("extend").is_none());
    }

    #[tokio::test]
    async fn missing_tag_is_unavailable() {
        let mut ws = WorkspaceBuilder::new("Guild");
        ws.container("alpha 1", 0, &[]);
        assert!(extend(&ws.platform(), TAG, "alpha")
            .await
            .expect("extend")
            .is_none());
    }

    #[tokio::test]
    async fn ten_extensions_then_ceiling() {
        let mut ws = WorkspaceBuilder::new("Guild");
        let tag = ws.tag(TAG);
        ws.container("alpha 1", 0, &[tag]);
        let platform = ws.platform();

        for expected in 2..=MAX_ORDINAL {
            let created = extend(&platform, TAG, "alpha")
                .await
                .expect("extend")
                .expect("room left");
            assert_eq!(created.name, format!("alpha {expected}"));
        }
        assert!(extend(&platform, TAG, "alpha").await.expect("extend").is_none());

        let snapshot: WorkspaceSnapshot = platform.snapshot().await;
        let containers = snapshot.channels.iter().filter(|c| c.is_container()).count();
        assert_eq!(containers, MAX_ORDINAL as usize);
    }

    #[tokio::test]
    async fn conflict_adopts_container_created_concurrently() {
        let mut ws = WorkspaceBuilder::new("Guild");
        let tag = ws.tag(TAG);
        ws.container("alpha 1", 0, &[tag]);
        let platform = ws.platform();

        let racer = Channel {
            id: ChannelId(9_000),
            name: "alpha 2".to_string(),
            kind: ChannelKind::Container,
            parent: None,
            position: 1,
            grants: vec![AccessGrant::allow(GrantTarget::Tag(tag), Permissions::VIEW_CHANNEL)],
        };
        platform.race_container(racer).await;

        let adopted = extend(&platform, TAG, "alpha")
            .await
            .expect("extend")
            .expect("adopted");
        assert_eq!(adopted.id, ChannelId(9_000));
        let snapshot = platform.snapshot().await;
        let alphas = snapshot
            .channels
            .iter()
            .filter(|c| c.name == "alpha 2")
            .count();
        assert_eq!(alphas, 1);
    }
}
