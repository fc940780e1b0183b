use sponsor_core::Invocation;
use sponsor_platform::ChannelId;

/// Where a message was posted. Only community invocations are served.
#[derive(Debug, Clone)]
pub enum CommandContext {
    Direct,
    Community(Invocation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Init,
    Sponsor,
    Rename,
    Find,
    Stales,
    FindSponsees,
    BulkApplySponseeTag,
    Drn,
    Help,
}

impl CommandAction {
    /// Match a command word case-insensitively. `sponsor_command` is the configured
    /// sponsor tag name, lower-cased.
    pub fn parse(word: &str, sponsor_command: &str) -> Option<Self> {
        let word = word.to_lowercase();
        if word == sponsor_command {
            return Some(CommandAction::Sponsor);
        }
        Some(match word.as_str() {
            "init" => CommandAction::Init,
            "rename" => CommandAction::Rename,
            "find" => CommandAction::Find,
            "stales" => CommandAction::Stales,
            "findsponsees" => CommandAction::FindSponsees,
            "bulkapplysponseetag" => CommandAction::BulkApplySponseeTag,
            "drn" => CommandAction::Drn,
            "help" => CommandAction::Help,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CommandAction::Init => "init",
            CommandAction::Sponsor => "sponsor",
            CommandAction::Rename => "rename",
            CommandAction::Find => "find",
            CommandAction::Stales => "stales",
            CommandAction::FindSponsees => "findsponsees",
            CommandAction::BulkApplySponseeTag => "bulkapplysponseetag",
            CommandAction::Drn => "drn",
            CommandAction::Help => "help",
        }
    }
}

/// A message the bot posts as a result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub channel: ChannelId,
    pub content: String,
}

/// Messages to post, in order. Empty when the command stays silent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub messages: Vec<Outgoing>,
}

impl CommandOutcome {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn reply(channel: ChannelId, content: impl Into<String>) -> Self {
        Self::silent().then(channel, content)
    }

    pub fn then(mut self, channel: ChannelId, content: impl Into<String>) -> Self {
        self.messages.push(Outgoing {
            channel,
            content: content.into(),
        });
        self
    }
}
