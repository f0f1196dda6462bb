use super::GameId;

/// Which protocol step a transaction belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepTag {
    Join,
    PublicKey,
    Shuffle,
    Decrypt,
}

impl StepTag {
    pub const ALL: [StepTag; 4] = [
        StepTag::Join,
        StepTag::PublicKey,
        StepTag::Shuffle,
        StepTag::Decrypt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepTag::Join => "join",
            StepTag::PublicKey => "pk",
            StepTag::Shuffle => "shuf",
            StepTag::Decrypt => "dec",
        }
    }
}

/// Transaction category of the form `<prefix><tag>:<game id>`, cut to the
/// ledger's maximum category length.
///
/// Game ids that only differ past the cut share their categories.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(prefix: &str, tag: StepTag, game_id: &GameId, max_len: usize) -> Self {
        let mut raw = format!("{prefix}{}:{game_id}", tag.as_str());
        if raw.len() > max_len {
            let mut cut = max_len;
            while !raw.is_char_boundary(cut) {
                cut -= 1;
            }
            raw.truncate(cut);
        }
        Self(raw)
    }

    /// A category used verbatim, e.g. one owned by the host application.
    pub fn raw(category: impl Into<String>) -> Self {
        Self(category.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The categories of one game, one per step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Categories {
    pub join: Category,
    pub public_key: Category,
    pub shuffle: Category,
    pub decrypt: Category,
}

impl Categories {
    pub fn new(prefix: &str, game_id: &GameId, max_len: usize) -> Self {
        let of = |tag| Category::new(prefix, tag, game_id, max_len);
        Self {
            join: of(StepTag::Join),
            public_key: of(StepTag::PublicKey),
            shuffle: of(StepTag::Shuffle),
            decrypt: of(StepTag::Decrypt),
        }
    }

    pub fn get(&self, tag: StepTag) -> &Category {
        match tag {
            StepTag::Join => &self.join,
            StepTag::PublicKey => &self.public_key,
            StepTag::Shuffle => &self.shuffle,
            StepTag::Decrypt => &self.decrypt,
        }
    }
}
