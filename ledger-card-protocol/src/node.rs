//! The host that drives one player through a game.
//!
//! A [`PlayerNode`] owns the local view of the game and polls the ledger on
//! one cadence per coordinator. Every tick reads what it needs from the
//! ledger, asks the matching planner in [`crate::coordinator`] what to do and
//! publishes the result. Nothing is kept between ticks that cannot be
//! recovered from the ledger, except the key pair.

use crate::cards::Deck;
use crate::config::ProtocolConfig;
use crate::coordinator::decryption::{
    apply_decryption, dealt_cards, decryptor, plan_decryption, DecryptionView,
};
use crate::coordinator::key_exchange::{
    is_complete, plan_key_publication, players_to_poll, KeyExchangeAction,
};
use crate::coordinator::shuffle_chain::{
    apply_shuffle_step, chain_predecessor, final_shuffler, plan_shuffle_step, ShuffleChainView,
};
use crate::coordinator::OtherPlayersPublicKeys;
use crate::error::ProtocolError;
use crate::ledger::{Address, Categories, GameId, Ledger, Signer, StepTag, TransactionId};
use crate::payload::{DeckPayload, PublicKeyPayload};
use crate::session::{GameSession, Phase, Progress};
use crate::{ECPoint, KeyPair, Scalar};

use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// What a single tick ended up doing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do right now.
    Idle,
    /// A collaborator the step needs (signer, key pair, counterparty key)
    /// is missing.
    Skipped,
    Published(TransactionId),
    /// New facts were read from the ledger.
    Observed,
}

pub struct PlayerNode<L: Ledger, R: RngCore + CryptoRng + Send + Sync> {
    config: ProtocolConfig,
    ledger: Arc<L>,
    signer: Option<Arc<dyn Signer>>,
    address: Address,
    session: GameSession,
    categories: Categories,
    preferred_dealer: Option<Address>,
    key_pair: Option<KeyPair>,
    other_keys: OtherPlayersPublicKeys,
    finished_deck: Option<Deck<Scalar>>,
    rng: R,
    phase: watch::Sender<Phase>,
}

impl<L: Ledger, R: RngCore + CryptoRng + Send + Sync> PlayerNode<L, R> {
    /// A player that takes part in the game identified by `game_id`.
    pub fn new(
        config: ProtocolConfig,
        ledger: Arc<L>,
        signer: Arc<dyn Signer>,
        game_id: GameId,
        creator: Address,
        rng: R,
    ) -> Self {
        let address = signer.address().clone();
        let mut node = Self::observer(config, ledger, address, game_id, creator, rng);
        node.signer = Some(signer);
        node
    }

    /// A node that follows the game without being able to publish. Every
    /// step that has to write is skipped.
    pub fn observer(
        config: ProtocolConfig,
        ledger: Arc<L>,
        address: Address,
        game_id: GameId,
        creator: Address,
        rng: R,
    ) -> Self {
        let categories = config.categories(&game_id);
        let session = GameSession::new(game_id, creator).with_seats(config.min_players);
        let (phase, _) = watch::channel(session.phase());
        Self {
            config,
            ledger,
            signer: None,
            address,
            session,
            categories,
            preferred_dealer: None,
            key_pair: None,
            other_keys: OtherPlayersPublicKeys::new(),
            finished_deck: None,
            rng,
            phase,
        }
    }

    /// Deal from `dealer` instead of the creator. Takes effect once the
    /// dealer is seated.
    pub fn with_dealer(mut self, dealer: Address) -> Self {
        self.preferred_dealer = Some(dealer);
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn public_key(&self) -> Option<ECPoint> {
        self.key_pair.map(|key_pair| key_pair.public_key)
    }

    pub fn other_keys(&self) -> &OtherPlayersPublicKeys {
        &self.other_keys
    }

    /// Whether the last deck of the shuffle chain has been seen.
    pub fn has_finished_encrypting(&self) -> bool {
        self.finished_deck.is_some()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    fn signer(&self) -> Option<Arc<dyn Signer>> {
        self.signer.clone()
    }

    async fn publish(
        &self,
        signer: &dyn Signer,
        tag: StepTag,
        payload: Vec<u8>,
    ) -> Result<TransactionId, ProtocolError> {
        let id = self
            .ledger
            .publish(
                signer,
                self.categories.get(tag),
                self.session.players(),
                payload,
            )
            .await?;
        Ok(id)
    }

    async fn has_published(&self, tag: StepTag) -> Result<bool, ProtocolError> {
        let latest = self
            .ledger
            .query_latest_by_sender(self.categories.get(tag), &self.address)
            .await?;
        Ok(latest.is_some())
    }

    async fn latest_deck(
        &self,
        tag: StepTag,
        sender: &Address,
    ) -> Result<Option<Deck<Scalar>>, ProtocolError> {
        let latest = self
            .ledger
            .query_latest_by_sender(self.categories.get(tag), sender)
            .await?;
        latest
            .map(|bytes| DeckPayload::from_bytes(&bytes).and_then(|payload| payload.deck()))
            .transpose()
    }

    /// Announce the local player to the creator. The creator is seated from
    /// the start and never joins.
    #[instrument(skip_all, fields(player = %self.address))]
    pub async fn join(&mut self) -> Result<TickOutcome, ProtocolError> {
        if &self.address == self.session.creator() {
            return Ok(TickOutcome::Idle);
        }
        if self.has_published(StepTag::Join).await? {
            return Ok(TickOutcome::Idle);
        }
        let Some(signer) = self.signer() else {
            debug!("no signer, not joining");
            return Ok(TickOutcome::Skipped);
        };

        let creator = self.session.creator().clone();
        let id = self
            .ledger
            .publish(
                signer.as_ref(),
                self.categories.get(StepTag::Join),
                std::slice::from_ref(&creator),
                Vec::new(),
            )
            .await?;
        info!(%id, game = %self.session.game_id(), "joined");
        Ok(TickOutcome::Published(id))
    }

    /// Seat everyone who joined since the last refresh, until the table is
    /// full. Join order decides who gets the seats, so every node agrees.
    pub async fn refresh_players(&mut self) -> Result<TickOutcome, ProtocolError> {
        let joined = self
            .ledger
            .query_latest_by_recipient(
                self.categories.get(StepTag::Join),
                self.session.creator(),
            )
            .await?;
        let seated = self.session.seat_players(&joined);

        if let Some(dealer) = &self.preferred_dealer {
            if self.session.dealer() != dealer && self.session.is_seated(dealer) {
                self.session.set_dealer(dealer.clone())?;
                info!(player = %self.address, %dealer, "dealer seated");
            }
        }

        if seated == 0 {
            return Ok(TickOutcome::Idle);
        }
        debug!(player = %self.address, seated, players = self.session.players().len(), "players joined");
        Ok(TickOutcome::Observed)
    }

    /// Publish the local key once, then collect the keys still missing.
    #[instrument(skip_all, fields(player = %self.address))]
    pub async fn key_exchange_tick(&mut self) -> Result<TickOutcome, ProtocolError> {
        // the table is known once enough players sat down
        if self.session.players().len() < self.config.min_players.max(2) {
            return Ok(TickOutcome::Idle);
        }

        let mut outcome = TickOutcome::Idle;
        let action = plan_key_publication(&self.session, &self.address, self.key_pair.is_some());
        if let Some(KeyExchangeAction::PublishKey { recipients }) = action {
            let Some(signer) = self.signer() else {
                debug!("no signer, key not published");
                return Ok(TickOutcome::Skipped);
            };
            // peers keep the first key they saw, a second one would not help
            if self.has_published(StepTag::PublicKey).await? {
                warn!("own key is on the ledger but its key pair was lost, stalling");
                return Ok(TickOutcome::Skipped);
            }
            let key_pair = KeyPair::generate(&mut self.rng);
            let payload = PublicKeyPayload::new(&key_pair.public_key)?.to_bytes()?;
            let id = self
                .ledger
                .publish(
                    signer.as_ref(),
                    self.categories.get(StepTag::PublicKey),
                    &recipients,
                    payload,
                )
                .await?;
            self.key_pair = Some(key_pair);
            info!(%id, "public key published");
            outcome = TickOutcome::Published(id);
        }

        let missing: Vec<Address> = players_to_poll(&self.session, &self.address, &self.other_keys)
            .into_iter()
            .cloned()
            .collect();
        for player in missing {
            let latest = self
                .ledger
                .query_latest_by_sender(self.categories.get(StepTag::PublicKey), &player)
                .await?;
            let Some(bytes) = latest else {
                continue;
            };
            match PublicKeyPayload::from_bytes(&bytes).and_then(|payload| payload.public_key()) {
                Ok(key) => {
                    if self.other_keys.merge(player.clone(), key) {
                        debug!(%player, "public key recorded");
                        if outcome == TickOutcome::Idle {
                            outcome = TickOutcome::Observed;
                        }
                    }
                }
                Err(e) => warn!(%player, ?e, "unreadable public key"),
            }
        }

        if is_complete(&self.session, &self.other_keys) && outcome == TickOutcome::Observed {
            info!(players = self.session.players().len(), "key exchange complete");
        }
        Ok(outcome)
    }

    /// Take the local turn in the shuffle chain once the predecessor's deck
    /// is on the ledger.
    #[instrument(skip_all, fields(player = %self.address))]
    pub async fn shuffle_tick(&mut self) -> Result<TickOutcome, ProtocolError> {
        if !self.session.is_seated(&self.address) {
            return Ok(TickOutcome::Idle);
        }
        let (Some(signer), Some(key_pair)) = (self.signer(), self.key_pair) else {
            debug!("missing signer or key pair, not shuffling");
            return Ok(TickOutcome::Skipped);
        };
        if self.has_published(StepTag::Shuffle).await? {
            return Ok(TickOutcome::Idle);
        }

        let previous_deck = match chain_predecessor(&self.session, &self.address) {
            Some(predecessor) => {
                let predecessor = predecessor.clone();
                self.latest_deck(StepTag::Shuffle, &predecessor).await?
            }
            None => None,
        };
        let view = ShuffleChainView {
            own_step_published: false,
            previous_deck,
            keys_collected: is_complete(&self.session, &self.other_keys),
        };
        let Some(step) = plan_shuffle_step(&self.session, &self.address, view) else {
            return Ok(TickOutcome::Idle);
        };
        let Some(counterparty) = self.other_keys.get(&step.encrypt_for).copied() else {
            debug!(next = %step.encrypt_for, "next player's key unknown");
            return Ok(TickOutcome::Skipped);
        };

        let deck = apply_shuffle_step(&mut self.rng, step.input, &counterparty, &key_pair)?;
        let payload = DeckPayload::new(&deck).to_bytes()?;
        let id = self.publish(signer.as_ref(), StepTag::Shuffle, payload).await?;
        info!(%id, next = %step.encrypt_for, "shuffled and encrypted deck");
        Ok(TickOutcome::Published(id))
    }

    /// Look for the deck of the last player in the chain.
    pub async fn refresh_encryption_status(&mut self) -> Result<TickOutcome, ProtocolError> {
        if self.finished_deck.is_some() || self.session.players().len() < 2 {
            return Ok(TickOutcome::Idle);
        }
        let Some(last) = final_shuffler(&self.session).cloned() else {
            return Ok(TickOutcome::Idle);
        };
        match self.latest_deck(StepTag::Shuffle, &last).await? {
            Some(deck) => {
                debug!(player = %self.address, %last, "shuffle chain finished");
                self.finished_deck = Some(deck);
                Ok(TickOutcome::Observed)
            }
            None => Ok(TickOutcome::Idle),
        }
    }

    #[instrument(skip_all, fields(player = %self.address))]
    pub async fn decryption_tick(&mut self) -> Result<TickOutcome, ProtocolError> {
        if decryptor(&self.session) != Some(&self.address) {
            return Ok(TickOutcome::Idle);
        }
        let (Some(signer), Some(key_pair)) = (self.signer(), self.key_pair) else {
            debug!("missing signer or key pair, not decrypting");
            return Ok(TickOutcome::Skipped);
        };
        self.refresh_encryption_status().await?;
        if self.finished_deck.is_none() || self.has_published(StepTag::Decrypt).await? {
            return Ok(TickOutcome::Idle);
        }

        let view = DecryptionView {
            finished_deck: self.finished_deck.clone(),
            own_step_published: false,
        };
        let Some(step) = plan_decryption(&self.session, &self.address, view) else {
            return Ok(TickOutcome::Idle);
        };
        let Some(counterparty) = self.other_keys.get(&step.counterparty).copied() else {
            debug!(next = %step.counterparty, "next player's key unknown");
            return Ok(TickOutcome::Skipped);
        };

        let deck = apply_decryption(&step.source, &counterparty, &key_pair)?;
        let payload = DeckPayload::new(&deck).to_bytes()?;
        let id = self.publish(signer.as_ref(), StepTag::Decrypt, payload).await?;
        info!(%id, "decrypted deck published");
        Ok(TickOutcome::Published(id))
    }

    /// Pick the local hand out of the decryptor's publication.
    pub async fn deal_tick(&mut self) -> Result<TickOutcome, ProtocolError> {
        if !self.session.cards().is_empty() {
            return Ok(TickOutcome::Idle);
        }
        if !self.session.is_seated(&self.address) {
            debug!(player = %self.address, "not seated, no cards");
            return Ok(TickOutcome::Skipped);
        }
        let Some(source) = decryptor(&self.session).cloned() else {
            return Ok(TickOutcome::Idle);
        };
        if &source == self.session.dealer() {
            return Ok(TickOutcome::Idle);
        }
        let Some(deck) = self.latest_deck(StepTag::Decrypt, &source).await? else {
            return Ok(TickOutcome::Idle);
        };

        let cards = dealt_cards(
            &self.session,
            &self.address,
            &deck,
            self.config.cards_per_player,
        )
        .ok_or_else(|| {
            let needed = self.config.cards_per_player * self.session.players().len();
            ProtocolError::DeckSize(deck.len(), needed)
        })?;
        if self.session.set_cards(cards) {
            info!(player = %self.address, count = self.session.cards().len(), "cards dealt");
        }
        Ok(TickOutcome::Observed)
    }

    /// Recompute the phase from what is known and announce changes.
    #[instrument(skip_all, fields(player = %self.address))]
    pub async fn session_tick(&mut self) -> Result<TickOutcome, ProtocolError> {
        self.refresh_players().await?;
        if !self.session.is_seated(&self.address) {
            return Ok(TickOutcome::Idle);
        }
        self.refresh_encryption_status().await?;

        let progress = Progress {
            keys_collected: self.key_pair.is_some()
                && is_complete(&self.session, &self.other_keys),
            shuffle_finished: self.finished_deck.is_some(),
        };
        let before = self.session.phase();
        let phase = self.session.observe(progress, self.config.min_players);
        if phase == before {
            return Ok(TickOutcome::Idle);
        }
        info!(game = %self.session.game_id(), from = %before, to = %phase, "phase changed");
        self.phase.send_replace(phase);
        Ok(TickOutcome::Observed)
    }

    fn log_failure(step: &str, result: Result<TickOutcome, ProtocolError>) {
        if let Err(e) = result {
            warn!(step, ?e, "tick failed, retrying next time");
        }
    }

    /// One pass of every coordinator. Failures are logged and retried on
    /// the next pass.
    pub async fn tick(&mut self) -> Phase {
        let result = self.join().await;
        Self::log_failure("join", result);
        let result = self.session_tick().await;
        Self::log_failure("session", result);
        let result = self.key_exchange_tick().await;
        Self::log_failure("key exchange", result);
        let result = self.shuffle_tick().await;
        Self::log_failure("shuffle", result);
        let result = self.decryption_tick().await;
        Self::log_failure("decryption", result);
        let result = self.deal_tick().await;
        Self::log_failure("deal", result);
        let result = self.session_tick().await;
        Self::log_failure("session", result);
        self.session.phase()
    }

    /// Poll every coordinator on its own cadence until `shutdown` turns true
    /// or its sender goes away. Returns the node so the caller can read the
    /// final session.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        let mut session_timer = interval(self.config.session_interval());
        let mut key_timer = interval(self.config.key_exchange_interval());
        let mut shuffle_timer = interval(self.config.shuffle_interval());
        let mut decryption_timer = interval(self.config.decryption_interval());
        for timer in [
            &mut session_timer,
            &mut key_timer,
            &mut shuffle_timer,
            &mut decryption_timer,
        ] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        info!(player = %self.address, game = %self.session.game_id(), "node started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = session_timer.tick() => {
                    let result = self.join().await;
                    Self::log_failure("join", result);
                    let result = self.session_tick().await;
                    Self::log_failure("session", result);
                }
                _ = key_timer.tick() => {
                    let result = self.key_exchange_tick().await;
                    Self::log_failure("key exchange", result);
                }
                _ = shuffle_timer.tick() => {
                    let result = self.shuffle_tick().await;
                    Self::log_failure("shuffle", result);
                }
                _ = decryption_timer.tick() => {
                    let result = self.decryption_tick().await;
                    Self::log_failure("decryption", result);
                    let result = self.deal_tick().await;
                    Self::log_failure("deal", result);
                }
            }
        }
        info!(player = %self.address, phase = %self.session.phase(), "node stopped");
        self
    }
}
