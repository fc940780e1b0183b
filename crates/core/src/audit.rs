use crate::allocator::Allocator;
use crate::duration::parse_duration;
use crate::error::{CoreError, Result};
use crate::limits::{LISTING_LIMIT, UNATTENDED_LOOKBACK};
use chrono::{DateTime, Utc};
use sponsor_platform::{Channel, Member, MemberId, Tag};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct StaleReport {
    pub sponsor: Tag,
    /// Spaces where every non-bot occupant is a sponsor.
    pub abandoned: Vec<Channel>,
    /// Spaces whose newest message predates `idle_since`.
    pub idle: Vec<Channel>,
    pub idle_since: Option<DateTime<Utc>>,
}

impl StaleReport {
    pub fn is_empty(&self) -> bool {
        self.abandoned.is_empty() && self.idle.is_empty()
    }
}

/// Result of a sponsor-only audit.
#[derive(Debug)]
pub enum Audit<T> {
    TagMissing(String),
    /// Caller does not hold the sponsor tag.
    NotPermitted,
    Done(T),
}

#[derive(Debug)]
pub struct Backfill {
    pub sponsee: Tag,
    pub tagged: usize,
}

impl Allocator {
    async fn sponsor_gate(&self, caller: &Member) -> Result<Audit<Tag>> {
        let Some(sponsor) = self.sponsor_tag().await? else {
            return Ok(Audit::TagMissing(self.tags().sponsor.clone()));
        };
        if !caller.has_tag(sponsor.id) {
            return Ok(Audit::NotPermitted);
        }
        Ok(Audit::Done(sponsor))
    }

    /// Classify managed spaces as abandoned, or idle for longer than `window`
    /// (see [`parse_duration`]; blank skips idle detection).
    ///
    /// The window is only parsed once the caller is known to be a sponsor.
    pub async fn find_stales(&self, caller: &Member, window: &str) -> Result<Audit<StaleReport>> {
        let sponsor = match self.sponsor_gate(caller).await? {
            Audit::Done(tag) => tag,
            Audit::TagMissing(name) => return Ok(Audit::TagMissing(name)),
            Audit::NotPermitted => return Ok(Audit::NotPermitted),
        };
        let idle_since = match parse_duration(window)? {
            Some(window) => {
                let window = chrono::Duration::from_std(window)
                    .map_err(|_| CoreError::InvalidDuration(format!("{window:?}")))?;
                Some(
                    Utc::now()
                        .checked_sub_signed(window)
                        .unwrap_or(DateTime::<Utc>::MIN_UTC),
                )
            }
            None => None,
        };
        log::info!("Looking for stale spaces, idle since {idle_since:?}");

        let bot = self.platform().bot_member().await?;
        let index = self.families().await?;
        let mut abandoned = Vec::new();
        let mut idle = Vec::new();
        for space in index.spaces() {
            let occupants = match self.platform().occupants(space.id).await {
                Ok(occupants) => occupants,
                Err(err) => {
                    log::error!("Could not list occupants of {}: {err}", space.name);
                    continue;
                }
            };
            let only_sponsors = occupants
                .iter()
                .filter(|member| member.id != bot.id)
                .all(|member| member.has_tag(sponsor.id));
            if only_sponsors {
                if abandoned.len() < LISTING_LIMIT {
                    abandoned.push(space.clone());
                }
                continue;
            }
            let Some(threshold) = idle_since else {
                continue;
            };
            if idle.len() >= LISTING_LIMIT {
                continue;
            }
            match self.platform().recent_messages(space.id, 1).await {
                Ok(messages) => {
                    let quiet = messages
                        .first()
                        .map_or(true, |newest| newest.created_at < threshold);
                    if quiet {
                        idle.push(space.clone());
                    }
                }
                Err(err) => log::error!("Could not fetch messages of {}: {err}", space.name),
            }
        }

        Ok(Audit::Done(StaleReport {
            sponsor,
            abandoned,
            idle,
            idle_since,
        }))
    }

    /// Spaces where no sponsor wrote any of the last few messages.
    pub async fn find_unattended(&self, caller: &Member) -> Result<Audit<Vec<Channel>>> {
        let sponsor = match self.sponsor_gate(caller).await? {
            Audit::Done(tag) => tag,
            Audit::TagMissing(name) => return Ok(Audit::TagMissing(name)),
            Audit::NotPermitted => return Ok(Audit::NotPermitted),
        };
        let bot = self.platform().bot_member().await?;
        let index = self.families().await?;
        let mut authors: HashMap<MemberId, bool> = HashMap::new();
        let mut found = Vec::new();

        for space in index.spaces() {
            if found.len() >= LISTING_LIMIT {
                break;
            }
            let visible = match self.platform().occupants(space.id).await {
                Ok(occupants) => occupants.iter().any(|member| member.id == bot.id),
                Err(err) => {
                    log::error!("Could not list occupants of {}: {err}", space.name);
                    continue;
                }
            };
            if !visible {
                continue;
            }
            let messages = match self
                .platform()
                .recent_messages(space.id, UNATTENDED_LOOKBACK)
                .await
            {
                Ok(messages) => messages,
                Err(err) => {
                    log::error!("Error fetching channel messages {}: {err}", space.name);
                    continue;
                }
            };
            let mut attended = false;
            for message in &messages {
                let is_sponsor = match authors.get(&message.author) {
                    Some(known) => *known,
                    None => {
                        let is_sponsor = match self.platform().member(message.author).await {
                            Ok(author) => author.has_tag(sponsor.id),
                            Err(err) => {
                                log::debug!("Unknown author {}: {err}", message.author);
                                false
                            }
                        };
                        authors.insert(message.author, is_sponsor);
                        is_sponsor
                    }
                };
                if is_sponsor {
                    attended = true;
                    break;
                }
            }
            if !attended {
                found.push(space.clone());
            }
        }
        Ok(Audit::Done(found))
    }

    /// Give the sponsee tag to every non-sponsor occupant of a managed space.
    pub async fn backfill_sponsee_tag(&self, caller: &Member) -> Result<Audit<Backfill>> {
        let sponsor = match self.sponsor_gate(caller).await? {
            Audit::Done(tag) => tag,
            Audit::TagMissing(name) => return Ok(Audit::TagMissing(name)),
            Audit::NotPermitted => return Ok(Audit::NotPermitted),
        };
        let Some(sponsee) = self.sponsee_tag().await? else {
            return Ok(Audit::TagMissing(self.tags().sponsee.clone()));
        };

        let index = self.families().await?;
        let mut seen: HashSet<MemberId> = HashSet::new();
        let mut tagged = 0;
        for space in index.spaces() {
            log::debug!("Checking channel {}", space.name);
            let occupants = match self.platform().occupants(space.id).await {
                Ok(occupants) => occupants,
                Err(err) => {
                    log::error!("Could not list occupants of {}: {err}", space.name);
                    continue;
                }
            };
            for member in occupants {
                if member.bot || member.has_tag(sponsor.id) || !seen.insert(member.id) {
                    continue;
                }
                if member.has_tag(sponsee.id) {
                    continue;
                }
                match self.platform().add_member_tag(member.id, sponsee.id).await {
                    Ok(()) => tagged += 1,
                    Err(err) => log::error!("Could not tag {}: {err}", member.display_name),
                }
            }
        }
        log::info!("Added {} to {tagged} members", sponsee.name);
        Ok(Audit::Done(Backfill { sponsee, tagged }))
    }
}
