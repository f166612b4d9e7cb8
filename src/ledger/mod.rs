//! The ledger store: owns bundles, transactions, validators and leaders and
//! enforces their key and reference invariants on every write.
//!
//! Every mutating operation validates its input first (`MalformedInput`),
//! then checks and writes as a single atomic unit, so a referenced row can't
//! vanish between the check and the write.

pub mod error;
pub mod memory;

use std::sync::Arc;

use serde::Deserialize;

use crate::{
    consts::MAX_RETAINED_EPOCHS,
    database::models::{
        Bundle, Leader, LedgerCounts, NewBundle, NewTransaction, NewValidator, Transaction, TransactionChanges,
        Validator,
    },
    types::{check_identifier, Epoch},
};

use self::error::LedgerError;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Keyset page over transaction ids.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Page {
    /// Only ids strictly greater than this one.
    pub after: Option<String>,
    pub limit: Option<i64>,
}

impl Page {
    pub fn after(id: impl Into<String>, limit: i64) -> Self {
        Page {
            after: Some(id.into()),
            limit: Some(limit),
        }
    }

    pub fn first(limit: i64) -> Self {
        Page {
            after: None,
            limit: Some(limit),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(after) = &self.after {
            check_identifier("after", after)?;
        }

        match self.limit {
            Some(limit) if limit < 0 => Err(LedgerError::malformed(
                "limit",
                format!("{} is negative", limit),
            )),
            _ => Ok(()),
        }
    }
}

/// Epochs kept by a prune ending at `current`: `current, current - 1, ...`,
/// `retain` of them at most, never below zero.
pub fn retained_epochs(current: Epoch, retain: u128) -> Result<Vec<Epoch>> {
    if retain > MAX_RETAINED_EPOCHS {
        return Err(LedgerError::malformed(
            "retain",
            format!("{} epochs, at most {} allowed", retain, MAX_RETAINED_EPOCHS),
        ));
    }

    Ok((0..retain)
        .map_while(|i| current.0.checked_sub(i).map(Epoch))
        .collect())
}

pub trait Ledger: Send + Sync {
    fn create_bundle(&self, new_bundle: NewBundle) -> Result<Bundle>;
    fn get_bundle(&self, b_id: &str) -> Result<Bundle>;
    /// Fails while any transaction still references the bundle.
    fn delete_bundle(&self, b_id: &str) -> Result<()>;

    fn create_transaction(&self, new_tx: NewTransaction) -> Result<Transaction>;
    fn update_transaction(&self, tx_id: &str, changes: TransactionChanges) -> Result<Transaction>;
    fn get_transaction(&self, tx_id: &str) -> Result<Transaction>;

    /// Transactions in `epoch`, ordered by id.
    fn transactions_by_epoch(&self, epoch: Epoch) -> Result<Vec<Transaction>> {
        self.transactions_by_epoch_after(epoch, &Page::default())
    }
    fn transactions_by_epoch_after(&self, epoch: Epoch, page: &Page) -> Result<Vec<Transaction>>;
    fn transactions_in_bundle(&self, b_id: &str) -> Result<Vec<Transaction>>;
    fn unvalidated_transactions(&self) -> Result<Vec<Transaction>>;
    fn count_transactions(&self) -> Result<i64>;
    /// Transaction, validator and leader counts from one consistent read.
    fn counts(&self) -> Result<LedgerCounts>;
    /// Deletes every transaction outside [`retained_epochs`], returning how
    /// many were removed.
    fn prune_transactions(&self, current: Epoch, retain: u128) -> Result<usize>;

    fn create_validator(&self, new_validator: NewValidator) -> Result<Validator>;
    fn get_validator(&self, address: &str) -> Result<Validator>;
    fn validators(&self) -> Result<Vec<Validator>>;
    /// Fails while the validator is a leader.
    fn delete_validator(&self, address: &str) -> Result<()>;

    fn create_leader(&self, address: &str) -> Result<Leader>;
    fn get_leader(&self, address: &str) -> Result<Leader>;
    fn leaders(&self) -> Result<Vec<Leader>>;
    fn delete_leader(&self, address: &str) -> Result<()>;
}

impl<L> Ledger for Arc<L>
where
    L: Ledger + ?Sized,
{
    fn create_bundle(&self, new_bundle: NewBundle) -> Result<Bundle> {
        (**self).create_bundle(new_bundle)
    }

    fn get_bundle(&self, b_id: &str) -> Result<Bundle> {
        (**self).get_bundle(b_id)
    }

    fn delete_bundle(&self, b_id: &str) -> Result<()> {
        (**self).delete_bundle(b_id)
    }

    fn create_transaction(&self, new_tx: NewTransaction) -> Result<Transaction> {
        (**self).create_transaction(new_tx)
    }

    fn update_transaction(&self, tx_id: &str, changes: TransactionChanges) -> Result<Transaction> {
        (**self).update_transaction(tx_id, changes)
    }

    fn get_transaction(&self, tx_id: &str) -> Result<Transaction> {
        (**self).get_transaction(tx_id)
    }

    fn transactions_by_epoch_after(&self, epoch: Epoch, page: &Page) -> Result<Vec<Transaction>> {
        (**self).transactions_by_epoch_after(epoch, page)
    }

    fn transactions_in_bundle(&self, b_id: &str) -> Result<Vec<Transaction>> {
        (**self).transactions_in_bundle(b_id)
    }

    fn unvalidated_transactions(&self) -> Result<Vec<Transaction>> {
        (**self).unvalidated_transactions()
    }

    fn count_transactions(&self) -> Result<i64> {
        (**self).count_transactions()
    }

    fn counts(&self) -> Result<LedgerCounts> {
        (**self).counts()
    }

    fn prune_transactions(&self, current: Epoch, retain: u128) -> Result<usize> {
        (**self).prune_transactions(current, retain)
    }

    fn create_validator(&self, new_validator: NewValidator) -> Result<Validator> {
        (**self).create_validator(new_validator)
    }

    fn get_validator(&self, address: &str) -> Result<Validator> {
        (**self).get_validator(address)
    }

    fn validators(&self) -> Result<Vec<Validator>> {
        (**self).validators()
    }

    fn delete_validator(&self, address: &str) -> Result<()> {
        (**self).delete_validator(address)
    }

    fn create_leader(&self, address: &str) -> Result<Leader> {
        (**self).create_leader(address)
    }

    fn get_leader(&self, address: &str) -> Result<Leader> {
        (**self).get_leader(address)
    }

    fn leaders(&self) -> Result<Vec<Leader>> {
        (**self).leaders()
    }

    fn delete_leader(&self, address: &str) -> Result<()> {
        (**self).delete_leader(address)
    }
}
