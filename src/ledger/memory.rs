use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::debug;

use super::{error::Entity, retained_epochs, Ledger, LedgerError, Page, Result};
use crate::{
    database::models::{
        Bundle, Leader, LedgerCounts, NewBundle, NewTransaction, NewValidator, Transaction, TransactionChanges,
        Validator,
    },
    types::{check_identifier, Epoch},
};

#[derive(Debug, Default)]
struct Tables {
    bundles: BTreeMap<String, Bundle>,
    transactions: BTreeMap<String, Transaction>,
    validators: BTreeMap<String, Validator>,
    leaders: BTreeSet<String>,
    // secondary indexes, kept in step with `transactions`
    by_epoch: HashMap<Epoch, BTreeSet<String>>,
    by_bundle: HashMap<String, BTreeSet<String>>,
}

impl Tables {
    fn index(&mut self, tx: &Transaction) {
        self.by_epoch
            .entry(tx.epoch)
            .or_default()
            .insert(tx.id.clone());
        if let Some(b_id) = &tx.bundle_id {
            self.by_bundle
                .entry(b_id.clone())
                .or_default()
                .insert(tx.id.clone());
        }
    }

    fn unindex(&mut self, tx: &Transaction) {
        remove_from(&mut self.by_epoch, &tx.epoch, &tx.id);
        if let Some(b_id) = &tx.bundle_id {
            remove_from(&mut self.by_bundle, b_id, &tx.id);
        }
    }

    fn collect<'a>(&self, ids: impl Iterator<Item = &'a String>) -> Vec<Transaction> {
        ids.filter_map(|id| self.transactions.get(id))
            .cloned()
            .collect()
    }

    fn bundle_exists(&self, b_id: &str, entity: Entity) -> Result<()> {
        if self.bundles.contains_key(b_id) {
            Ok(())
        } else {
            Err(LedgerError::foreign_key(entity, Entity::Bundle, b_id))
        }
    }
}

fn remove_from<K>(index: &mut HashMap<K, BTreeSet<String>>, key: &K, id: &str)
where
    K: std::hash::Hash + Eq,
{
    if let Some(ids) = index.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

/// Ledger kept entirely in memory.
///
/// Uniqueness and foreign keys are checked under the write lock that also
/// performs the write. Nothing survives the process; use `PgLedger` for a
/// durable store.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    tables: RwLock<Tables>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".to_string()))
    }
}

impl Ledger for MemoryLedger {
    fn create_bundle(&self, new_bundle: NewBundle) -> Result<Bundle> {
        new_bundle.validate()?;

        let mut tables = self.write()?;
        if tables.bundles.contains_key(&new_bundle.id) {
            return Err(LedgerError::duplicate(Entity::Bundle, &new_bundle.id));
        }

        let b = Bundle::from(new_bundle);
        tables.bundles.insert(b.id.clone(), b.clone());
        debug!("Inserted bundle {}", b.id);
        Ok(b)
    }

    fn get_bundle(&self, b_id: &str) -> Result<Bundle> {
        check_identifier("id", b_id)?;

        self.read()?
            .bundles
            .get(b_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Entity::Bundle, b_id))
    }

    fn delete_bundle(&self, b_id: &str) -> Result<()> {
        check_identifier("id", b_id)?;

        let mut tables = self.write()?;
        if !tables.bundles.contains_key(b_id) {
            return Err(LedgerError::not_found(Entity::Bundle, b_id));
        }
        if tables.by_bundle.contains_key(b_id) {
            return Err(LedgerError::foreign_key(
                Entity::Transaction,
                Entity::Bundle,
                b_id,
            ));
        }

        tables.bundles.remove(b_id);
        debug!("Deleted bundle {}", b_id);
        Ok(())
    }

    fn create_transaction(&self, new_tx: NewTransaction) -> Result<Transaction> {
        new_tx.validate()?;

        let mut tables = self.write()?;
        if tables.transactions.contains_key(&new_tx.id) {
            return Err(LedgerError::duplicate(Entity::Transaction, &new_tx.id));
        }
        if let Some(b_id) = &new_tx.bundle_id {
            tables.bundle_exists(b_id, Entity::Transaction)?;
        }

        let tx = Transaction::from(new_tx);
        tables.index(&tx);
        tables.transactions.insert(tx.id.clone(), tx.clone());
        debug!("Inserted tx {} in epoch {}", tx.id, tx.epoch);
        Ok(tx)
    }

    fn update_transaction(&self, tx_id: &str, changes: TransactionChanges) -> Result<Transaction> {
        check_identifier("id", tx_id)?;
        changes.validate()?;

        let mut tables = self.write()?;
        let mut tx = tables
            .transactions
            .get(tx_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Entity::Transaction, tx_id))?;
        if let Some(b_id) = changes.new_bundle_id() {
            tables.bundle_exists(b_id, Entity::Transaction)?;
        }
        if changes.is_empty() {
            return Ok(tx);
        }

        tables.unindex(&tx);
        changes.apply(&mut tx);
        tables.index(&tx);
        tables.transactions.insert(tx.id.clone(), tx.clone());
        debug!("Updated tx {}", tx.id);
        Ok(tx)
    }

    fn get_transaction(&self, tx_id: &str) -> Result<Transaction> {
        check_identifier("id", tx_id)?;

        self.read()?
            .transactions
            .get(tx_id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Entity::Transaction, tx_id))
    }

    fn transactions_by_epoch_after(&self, epoch: Epoch, page: &Page) -> Result<Vec<Transaction>> {
        page.validate()?;

        let tables = self.read()?;
        let ids = match tables.by_epoch.get(&epoch) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        let limit = page.limit.map_or(usize::MAX, |l| l as usize);
        let txs = match &page.after {
            Some(after) => tables.collect(
                ids.range::<String, _>((
                    std::ops::Bound::Excluded(after),
                    std::ops::Bound::Unbounded,
                ))
                .take(limit),
            ),
            None => tables.collect(ids.iter().take(limit)),
        };
        Ok(txs)
    }

    fn transactions_in_bundle(&self, b_id: &str) -> Result<Vec<Transaction>> {
        check_identifier("bundle_id", b_id)?;

        let tables = self.read()?;
        Ok(match tables.by_bundle.get(b_id) {
            Some(ids) => tables.collect(ids.iter()),
            None => Vec::new(),
        })
    }

    fn unvalidated_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self
            .read()?
            .transactions
            .values()
            .filter(|tx| !tx.validated)
            .cloned()
            .collect())
    }

    fn count_transactions(&self) -> Result<i64> {
        Ok(self.read()?.transactions.len() as i64)
    }

    fn counts(&self) -> Result<LedgerCounts> {
        let tables = self.read()?;
        Ok(LedgerCounts {
            transactions: tables.transactions.len() as i64,
            validators: tables.validators.len() as i64,
            leaders: tables.leaders.len() as i64,
        })
    }

    fn prune_transactions(&self, current: Epoch, retain: u128) -> Result<usize> {
        let keep: BTreeSet<Epoch> = retained_epochs(current, retain)?.into_iter().collect();

        let mut tables = self.write()?;
        let doomed: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|tx| !keep.contains(&tx.epoch))
            .cloned()
            .collect();
        for tx in &doomed {
            tables.unindex(tx);
            tables.transactions.remove(&tx.id);
        }

        debug!(
            "Pruned {} transactions outside the last {} epochs up to {}",
            doomed.len(),
            retain,
            current
        );
        Ok(doomed.len())
    }

    fn create_validator(&self, new_validator: NewValidator) -> Result<Validator> {
        new_validator.validate()?;

        let mut tables = self.write()?;
        if tables.validators.contains_key(&new_validator.address) {
            return Err(LedgerError::duplicate(
                Entity::Validator,
                &new_validator.address,
            ));
        }

        let v = Validator::from(new_validator);
        tables.validators.insert(v.address.clone(), v.clone());
        debug!("Inserted validator {}", v.address);
        Ok(v)
    }

    fn get_validator(&self, address: &str) -> Result<Validator> {
        check_identifier("address", address)?;

        self.read()?
            .validators
            .get(address)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(Entity::Validator, address))
    }

    fn validators(&self) -> Result<Vec<Validator>> {
        Ok(self.read()?.validators.values().cloned().collect())
    }

    fn delete_validator(&self, address: &str) -> Result<()> {
        check_identifier("address", address)?;

        let mut tables = self.write()?;
        if !tables.validators.contains_key(address) {
            return Err(LedgerError::not_found(Entity::Validator, address));
        }
        if tables.leaders.contains(address) {
            return Err(LedgerError::foreign_key(
                Entity::Leader,
                Entity::Validator,
                address,
            ));
        }

        tables.validators.remove(address);
        debug!("Deleted validator {}", address);
        Ok(())
    }

    fn create_leader(&self, address: &str) -> Result<Leader> {
        check_identifier("address", address)?;

        let mut tables = self.write()?;
        if !tables.validators.contains_key(address) {
            return Err(LedgerError::foreign_key(
                Entity::Leader,
                Entity::Validator,
                address,
            ));
        }
        if !tables.leaders.insert(address.to_owned()) {
            return Err(LedgerError::duplicate(Entity::Leader, address));
        }

        debug!("Inserted leader {}", address);
        Ok(Leader {
            address: address.to_owned(),
        })
    }

    fn get_leader(&self, address: &str) -> Result<Leader> {
        check_identifier("address", address)?;

        if self.read()?.leaders.contains(address) {
            Ok(Leader {
                address: address.to_owned(),
            })
        } else {
            Err(LedgerError::not_found(Entity::Leader, address))
        }
    }

    fn leaders(&self) -> Result<Vec<Leader>> {
        Ok(self
            .read()?
            .leaders
            .iter()
            .map(|address| Leader {
                address: address.clone(),
            })
            .collect())
    }

    fn delete_leader(&self, address: &str) -> Result<()> {
        check_identifier("address", address)?;

        if self.write()?.leaders.remove(address) {
            debug!("Deleted leader {}", address);
            Ok(())
        } else {
            Err(LedgerError::not_found(Entity::Leader, address))
        }
    }
}
