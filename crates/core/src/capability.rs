use crate::error::Result;
use crate::limits::TagNames;
use sponsor_platform::{Member, Platform, Tag};

/// One of the three membership tags the bot manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedTag {
    Sponsee,
    Sponsor,
    Container,
}

impl ManagedTag {
    pub fn role(self) -> &'static str {
        match self {
            Self::Sponsee => "sponsee role",
            Self::Sponsor => "sponsor role",
            Self::Container => "sponsor channel role",
        }
    }
}

#[derive(Debug, Default)]
pub struct InitReport {
    /// Tags created by this call, in creation order.
    pub created: Vec<(ManagedTag, Tag)>,
    pub bot_granted_sponsor: bool,
}

impl InitReport {
    pub fn changed(&self) -> bool {
        !self.created.is_empty()
    }
}

pub async fn resolve_tag(platform: &dyn Platform, name: &str) -> Result<Option<Tag>> {
    let tags = platform.tags().await?;
    Ok(tags.into_iter().find(|tag| tag.name == name))
}

pub fn holds_tag(member: &Member, tag: &Tag) -> bool {
    member.has_tag(tag.id)
}

/// Create whichever managed tags are missing. Safe to call repeatedly.
pub async fn ensure_managed_tags(platform: &dyn Platform, names: &TagNames) -> Result<InitReport> {
    let existing = platform.tags().await?;
    let find = |name: &str| existing.iter().find(|tag| tag.name == name).cloned();

    let mut report = InitReport::default();
    let mut sponsor = find(names.sponsor.as_str());
    for (kind, name) in [
        (ManagedTag::Sponsee, &names.sponsee),
        (ManagedTag::Sponsor, &names.sponsor),
        (ManagedTag::Container, &names.container),
    ] {
        if find(name.as_str()).is_some() {
            continue;
        }
        let tag = platform.create_tag(name, false).await?;
        log::info!("Created {} {:?}", kind.role(), tag.name);
        if kind == ManagedTag::Sponsor {
            sponsor = Some(tag.clone());
        }
        report.created.push((kind, tag));
    }

    let needs_bot_grant = report
        .created
        .iter()
        .any(|(kind, _)| matches!(kind, ManagedTag::Sponsor | ManagedTag::Container));
    if needs_bot_grant {
        if let Some(sponsor) = sponsor {
            let bot = platform.bot_member().await?;
            platform.add_member_tag(bot.id, sponsor.id).await?;
            report.bot_granted_sponsor = true;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sponsor_platform::{WorkspaceBuilder, BOT_ID};

    #[tokio::test]
    async fn creates_all_tags_once_and_grants_bot_sponsor() {
        let platform = WorkspaceBuilder::new("Guild").platform();
        let names = TagNames::default();

        let first = ensure_managed_tags(&platform, &names).await.expect("init");
        let kinds: Vec<_> = first.created.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            kinds,
            vec![ManagedTag::Sponsee, ManagedTag::Sponsor, ManagedTag::Container]
        );
        assert!(first.bot_granted_sponsor);

        let second = ensure_managed_tags(&platform, &names).await.expect("init again");
        assert!(!second.changed());
        assert!(!second.bot_granted_sponsor);

        let sponsor = resolve_tag(&platform, "Sponsor")
            .await
            .expect("resolve")
            .expect("sponsor tag");
        let bot = platform.member(BOT_ID).await.expect("bot");
        assert!(holds_tag(&bot, &sponsor));
        assert_eq!(platform.tags().await.expect("tags").len(), 3);
    }

    #[tokio::test]
    async fn missing_sponsee_only_does_not_touch_bot() {
        let mut ws = WorkspaceBuilder::new("Guild");
        ws.tag("Sponsor");
        ws.tag("Sponsor Channel");
        let platform = ws.platform();

        let report = ensure_managed_tags(&platform, &TagNames::default())
            .await
            .expect("init");
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].0, ManagedTag::Sponsee);
        assert!(!report.bot_granted_sponsor);
    }

    #[tokio::test]
    async fn resolve_tag_requires_exact_name() {
        let mut ws = WorkspaceBuilder::new("Guild");
        ws.tag("Sponsor");
        let platform = ws.platform();
        assert!(resolve_tag(&platform, "sponsor").await.expect("resolve").is_none());
        assert!(resolve_tag(&platform, "Sponsor").await.expect("resolve").is_some());
    }
}
