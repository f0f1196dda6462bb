use super::{Address, Category, Ledger, LedgerError, Signer, TransactionId};

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// One appended transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub category: String,
    pub sender: Address,
    pub recipients: Vec<Address>,
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Default)]
struct State {
    transactions: Vec<Transaction>,
    failures_pending: usize,
    lost_replies_pending: usize,
}

/// Append-only ledger held in memory, shared by every simulated player.
///
/// `fail_next` makes the following calls fail the way a flaky network would,
/// which is how tests exercise the retry-on-next-tick behaviour.
/// `drop_next_replies` appends the next publications but reports them as
/// failed, the way a timeout after a successful submission looks.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<State>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `calls` ledger calls, reads and writes alike.
    pub fn fail_next(&self, calls: usize) {
        self.state().failures_pending = calls;
    }

    pub fn drop_next_replies(&self, publications: usize) {
        self.state().lost_replies_pending = publications;
    }

    fn take_failure(state: &mut State) -> Result<(), LedgerError> {
        if state.failures_pending > 0 {
            state.failures_pending -= 1;
            return Err(LedgerError::Unavailable(String::from("injected failure")));
        }
        Ok(())
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.state().transactions.clone()
    }

    pub fn count_in_category(&self, category: &Category) -> usize {
        self.state()
            .transactions
            .iter()
            .filter(|tx| tx.category == category.as_str())
            .count()
    }

    /// Senders in `category`, one entry per transaction, in ledger order.
    pub fn senders_in(&self, category: &Category) -> Vec<Address> {
        self.state()
            .transactions
            .iter()
            .filter(|tx| tx.category == category.as_str())
            .map(|tx| tx.sender.clone())
            .collect()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn publish(
        &self,
        signer: &dyn Signer,
        category: &Category,
        recipients: &[Address],
        payload: Vec<u8>,
    ) -> Result<TransactionId, LedgerError> {
        let signature = signer.sign_message(&payload);

        let mut state = self.state();
        Self::take_failure(&mut state)?;

        let id = TransactionId::new(format!("tx{}", state.transactions.len()));
        trace!(%id, category = category.as_str(), sender = %signer.address(), "appended");
        state.transactions.push(Transaction {
            id: id.clone(),
            category: category.as_str().to_string(),
            sender: signer.address().clone(),
            recipients: recipients.to_vec(),
            payload,
            signature,
        });
        if state.lost_replies_pending > 0 {
            state.lost_replies_pending -= 1;
            return Err(LedgerError::Unavailable(format!("reply for {id} lost")));
        }
        Ok(id)
    }

    async fn query_latest_by_sender(
        &self,
        category: &Category,
        sender: &Address,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let mut state = self.state();
        Self::take_failure(&mut state)?;

        Ok(state
            .transactions
            .iter()
            .rev()
            .find(|tx| tx.category == category.as_str() && &tx.sender == sender)
            .map(|tx| tx.payload.clone()))
    }

    async fn query_latest_by_recipient(
        &self,
        category: &Category,
        recipient: &Address,
    ) -> Result<Vec<Address>, LedgerError> {
        let mut state = self.state();
        Self::take_failure(&mut state)?;

        let mut senders: Vec<Address> = Vec::new();
        for tx in state
            .transactions
            .iter()
            .filter(|tx| tx.category == category.as_str() && tx.recipients.contains(recipient))
        {
            if !senders.contains(&tx.sender) {
                senders.push(tx.sender.clone());
            }
        }
        Ok(senders)
    }
}
