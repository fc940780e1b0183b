use sponsor_platform::{ChannelId, Member, MemberId, MessageId};

/// A command issued inside the community workspace.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub caller: Member,
    /// Channel the command was posted in.
    pub channel: ChannelId,
    /// The command message itself.
    pub message: MessageId,
    pub mentions: Vec<MemberId>,
}

/// `<family> <freeText...>` arguments shared by `sponsor` and `rename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceRequest {
    /// Lower-cased family key.
    pub family: String,
    /// Remaining tokens joined without separators.
    pub label: String,
}

impl SpaceRequest {
    /// `None` unless at least two arguments are present.
    pub fn parse(args: &[&str]) -> Option<Self> {
        let (family, rest) = args.split_first()?;
        if rest.is_empty() {
            return None;
        }
        Some(Self {
            family: family.to_lowercase(),
            label: rest.concat(),
        })
    }

    /// `"<displayName>-<label>"`.
    pub fn space_name(&self, owner: &Member) -> String {
        format!("{}-{}", owner.display_name, self.label)
    }
}
