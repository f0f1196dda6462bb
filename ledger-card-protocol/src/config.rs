use crate::cards::DECK_SIZE;
use crate::error::ProtocolError;
use crate::ledger::{Categories, GameId, StepTag};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default = "default_protocol_prefix")]
    pub protocol_prefix: String,
    #[serde(default = "default_max_category_len")]
    pub max_category_len: usize,
    #[serde(default = "default_min_players")]
    pub min_players: usize,
    #[serde(default = "default_cards_per_player")]
    pub cards_per_player: usize,
    #[serde(default = "default_key_exchange_interval_ms")]
    pub key_exchange_interval_ms: u64,
    #[serde(default = "default_shuffle_interval_ms")]
    pub shuffle_interval_ms: u64,
    #[serde(default = "default_decryption_interval_ms")]
    pub decryption_interval_ms: u64,
    #[serde(default = "default_session_interval_ms")]
    pub session_interval_ms: u64,
}

fn default_protocol_prefix() -> String {
    String::from("mp:")
}

fn default_max_category_len() -> usize {
    30 // ledger limit
}

fn default_min_players() -> usize {
    3
}

fn default_cards_per_player() -> usize {
    2 // hole cards
}

fn default_key_exchange_interval_ms() -> u64 {
    2_000
}

fn default_shuffle_interval_ms() -> u64 {
    2_000
}

fn default_decryption_interval_ms() -> u64 {
    4_000
}

fn default_session_interval_ms() -> u64 {
    2_000
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            protocol_prefix: default_protocol_prefix(),
            max_category_len: default_max_category_len(),
            min_players: default_min_players(),
            cards_per_player: default_cards_per_player(),
            key_exchange_interval_ms: default_key_exchange_interval_ms(),
            shuffle_interval_ms: default_shuffle_interval_ms(),
            decryption_interval_ms: default_decryption_interval_ms(),
            session_interval_ms: default_session_interval_ms(),
        }
    }
}

impl ProtocolConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ProtocolError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.min_players < 2 {
            return Err(ProtocolError::Config(format!(
                "min_players must be at least 2, got {}",
                self.min_players
            )));
        }
        if self.cards_per_player == 0 {
            return Err(ProtocolError::Config(String::from(
                "cards_per_player must be positive",
            )));
        }
        let dealt = self.cards_per_player.saturating_mul(self.min_players);
        if dealt > DECK_SIZE {
            return Err(ProtocolError::Config(format!(
                "{} players with {} cards each need {dealt} cards, the deck has {DECK_SIZE}",
                self.min_players, self.cards_per_player
            )));
        }

        // every category must keep at least one character of the game id
        let longest_tag = StepTag::ALL
            .iter()
            .map(|tag| tag.as_str().len())
            .max()
            .unwrap_or_default();
        let fixed = self.protocol_prefix.len() + longest_tag + 1;
        if fixed >= self.max_category_len {
            return Err(ProtocolError::Config(format!(
                "prefix {:?} leaves no room for the game id within {} characters",
                self.protocol_prefix, self.max_category_len
            )));
        }

        let intervals = [
            self.key_exchange_interval_ms,
            self.shuffle_interval_ms,
            self.decryption_interval_ms,
            self.session_interval_ms,
        ];
        if intervals.contains(&0) {
            return Err(ProtocolError::Config(String::from(
                "poll intervals must be positive",
            )));
        }
        Ok(())
    }

    /// Use the same poll interval for every coordinator.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        let ms = interval.as_millis().max(1) as u64;
        self.key_exchange_interval_ms = ms;
        self.shuffle_interval_ms = ms;
        self.decryption_interval_ms = ms;
        self.session_interval_ms = ms;
        self
    }

    pub fn categories(&self, game_id: &GameId) -> Categories {
        Categories::new(&self.protocol_prefix, game_id, self.max_category_len)
    }

    pub fn key_exchange_interval(&self) -> Duration {
        Duration::from_millis(self.key_exchange_interval_ms)
    }

    pub fn shuffle_interval(&self) -> Duration {
        Duration::from_millis(self.shuffle_interval_ms)
    }

    pub fn decryption_interval(&self) -> Duration {
        Duration::from_millis(self.decryption_interval_ms)
    }

    pub fn session_interval(&self) -> Duration {
        Duration::from_millis(self.session_interval_ms)
    }
}
