//! Line-oriented driver that feeds commands to a [`CommandHandler`] over a
//! [`MemoryPlatform`].
//!
//! Each input line is `<member_id> <channel_id> <text...>`; `dm` in place of the channel
//! id posts as a direct message. Mentions are written `<@member_id>`.

use crate::command::{CommandContext, CommandHandler};
use anyhow::{Context as AnyhowContext, Result};
use regex::Regex;
use sponsor_core::{Invocation, TagNames};
use sponsor_platform::{
    ChannelId, MemberId, MemoryPlatform, Message, Platform, WorkspaceBuilder, WorkspaceSnapshot,
    BOT_ID,
};
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub member: MemberId,
    /// `None` for a direct message.
    pub channel: Option<ChannelId>,
    pub text: String,
}

pub fn parse_line(line: &str) -> Option<ConsoleLine> {
    let line = line.trim();
    let (member, rest) = line.split_once(char::is_whitespace)?;
    let (channel, text) = rest.trim_start().split_once(char::is_whitespace)?;
    let channel = match channel {
        "dm" => None,
        id => Some(ChannelId(id.parse().ok()?)),
    };
    Some(ConsoleLine {
        member: MemberId(member.parse().ok()?),
        channel,
        text: text.trim().to_string(),
    })
}

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<@!?(\d+)>").unwrap_or_else(|_| unreachable!("mention regex is valid"))
    })
}

/// Member mentions in order of appearance, without duplicates.
pub fn parse_mentions(text: &str) -> Vec<MemberId> {
    let mut mentions = Vec::new();
    for caps in mention_regex().captures_iter(text) {
        if let Ok(id) = caps[1].parse() {
            let id = MemberId(id);
            if !mentions.contains(&id) {
                mentions.push(id);
            }
        }
    }
    mentions
}

async fn dispatch(
    platform: Arc<MemoryPlatform>,
    handler: Arc<CommandHandler>,
    line: ConsoleLine,
) -> Result<()> {
    let context = match line.channel {
        None => CommandContext::Direct,
        Some(channel) => {
            let caller = platform
                .member(line.member)
                .await
                .with_context(|| format!("Unknown member {}", line.member))?;
            let message = platform.post(channel, caller.id, &line.text).await;
            CommandContext::Community(Invocation {
                caller,
                channel,
                message,
                mentions: parse_mentions(&line.text),
            })
        }
    };
    handler.handle(context, &line.text).await
}

/// Run every line of `input` as its own task and wait for all of them. Returns the
/// messages the bot posted meanwhile, in posting order.
pub async fn run<R>(
    platform: Arc<MemoryPlatform>,
    handler: Arc<CommandHandler>,
    input: R,
) -> Result<Vec<Message>>
where
    R: AsyncBufRead + Unpin,
{
    let already_sent = platform.sent_messages().await.len();
    let mut tasks = JoinSet::new();
    let mut lines = input.lines();
    while let Some(raw) = lines.next_line().await.context("Failed to read input")? {
        if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
            continue;
        }
        let Some(line) = parse_line(&raw) else {
            log::warn!("Skipping malformed line: {raw}");
            continue;
        };
        tasks.spawn(dispatch(platform.clone(), handler.clone(), line));
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => log::error!("Error handling command: {err:#}"),
            Err(err) => log::error!("Command task failed: {err}"),
        }
    }
    Ok(platform
        .sent_messages()
        .await
        .into_iter()
        .skip(already_sent)
        .collect())
}

/// A small workspace to try the bot against: two families, one sponsor, two sponsees.
pub fn demo_workspace(tags: &TagNames) -> WorkspaceSnapshot {
    let mut ws = WorkspaceBuilder::new("Demo Guild");
    let container = ws.tag(&tags.container);
    let sponsor = ws.tag(&tags.sponsor);
    ws.tag(&tags.sponsee);
    ws.give_tag(BOT_ID, sponsor);

    let sam = ws.member("Sam", &[sponsor]);
    let pat = ws.member("Pat", &[]);
    ws.member("Quinn", &[]);
    let lobby = ws.container("Lobby", 0, &[]);
    ws.text_channel("bot-commands", lobby);
    let alpha = ws.container("Alpha 1", 1, &[container]);
    ws.container("Beta 1", 2, &[container]);
    ws.space("Pat-rome", alpha, &[pat], &[sponsor]);
    ws.space("Sam-notes", alpha, &[sam], &[sponsor]);
    ws.fill(alpha, 3);
    ws.build()
}
