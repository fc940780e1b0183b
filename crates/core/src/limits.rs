/// Hard platform cap on child spaces per container.
pub const SPACES_PER_CONTAINER: usize = 50;

/// Highest ordinal a family instance may carry: the seeded `1` plus ten extensions.
pub const MAX_ORDINAL: u32 = 11;

/// Upper bound on entries in any listing reply.
pub const LISTING_LIMIT: usize = 50;

/// Messages inspected per space when looking for unattended sponsees.
pub const UNATTENDED_LOOKBACK: usize = 5;

/// Names of the three managed membership tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNames {
    pub sponsee: String,
    pub sponsor: String,
    pub container: String,
}

impl Default for TagNames {
    fn default() -> Self {
        Self {
            sponsee: "Sponsee".to_string(),
            sponsor: "Sponsor".to_string(),
            container: "Sponsor Channel".to_string(),
        }
    }
}
