pub mod models;
pub mod queries;
pub mod schema;

use diesel::{
    r2d2::{self, ConnectionManager, PooledConnection},
    result::{DatabaseErrorKind, Error},
    Connection, PgConnection,
};
use log::{error, info};

use crate::{
    ledger::{
        error::{Entity, LedgerError},
        retained_epochs, Ledger, Page, Result,
    },
    types::{check_identifier, DbPool, Epoch},
};

use self::models::{
    Bundle, Leader, LedgerCounts, NewBundle, NewTransaction, NewValidator, Transaction, TransactionChanges,
    Validator,
};

embed_migrations!();

pub fn run_migrations(conn: &PgConnection) -> Result<()> {
    embedded_migrations::run(conn).map_err(|err| {
        error!("Error occurred while running migrations - {}", err);
        LedgerError::Storage(err.to_string())
    })
}

impl From<Error> for LedgerError {
    fn from(e: Error) -> Self {
        error!("Error occurred while db op - {}", e);
        LedgerError::Storage(e.to_string())
    }
}

/// Maps a constraint the database enforced itself (a concurrent writer won
/// the race past our own check) onto the ledger taxonomy.
fn classify(
    err: Error,
    unique: Option<LedgerError>,
    foreign_key: Option<LedgerError>,
) -> LedgerError {
    let classified = match &err {
        Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => unique,
        Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => foreign_key,
        _ => None,
    };
    classified.unwrap_or_else(|| LedgerError::from(err))
}

/// Ledger backed by PostgreSQL.
///
/// Expects the schema from `migrations/` to be in place. Each mutation runs
/// in its own database transaction, and rows it depends on are locked so the
/// check and the write see the same state.
#[derive(Clone)]
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn connect(database_url: &str, pool_size: u32) -> Result<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|err| {
                error!("Failed to create database connection pool - {}", err);
                LedgerError::Storage(err.to_string())
            })?;

        Ok(Self::new(pool))
    }

    pub fn migrate(&self) -> Result<()> {
        info!("Running pending migrations");
        run_migrations(&*self.connection()?)
    }

    fn connection(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>> {
        self.pool.get().map_err(|err| {
            error!("Failed to get connection from database connection pool - {}", err);
            LedgerError::Storage(err.to_string())
        })
    }

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PgConnection) -> Result<T>,
    {
        let conn = self.connection()?;
        conn.transaction(|| f(&conn))
    }
}

impl Ledger for PgLedger {
    fn create_bundle(&self, new_bundle: NewBundle) -> Result<Bundle> {
        new_bundle.validate()?;

        self.write(|conn| {
            let duplicate = || LedgerError::duplicate(Entity::Bundle, &new_bundle.id);
            if queries::get_bundle(conn, &new_bundle.id)?.is_some() {
                return Err(duplicate());
            }

            queries::insert_bundle(conn, &new_bundle)
                .map_err(|err| classify(err, Some(duplicate()), None))
        })
    }

    fn get_bundle(&self, b_id: &str) -> Result<Bundle> {
        check_identifier("id", b_id)?;

        queries::get_bundle(&*self.connection()?, b_id)?
            .ok_or_else(|| LedgerError::not_found(Entity::Bundle, b_id))
    }

    fn delete_bundle(&self, b_id: &str) -> Result<()> {
        check_identifier("id", b_id)?;

        self.write(|conn| {
            let referenced = || LedgerError::foreign_key(Entity::Transaction, Entity::Bundle, b_id);
            if queries::lock_bundle(conn, b_id)?.is_none() {
                return Err(LedgerError::not_found(Entity::Bundle, b_id));
            }
            if queries::count_bundle_txs(conn, b_id)? > 0 {
                return Err(referenced());
            }

            queries::delete_bundle(conn, b_id)
                .map(|_| ())
                .map_err(|err| classify(err, None, Some(referenced())))
        })
    }

    fn create_transaction(&self, new_tx: NewTransaction) -> Result<Transaction> {
        new_tx.validate()?;

        self.write(|conn| {
            let duplicate = || LedgerError::duplicate(Entity::Transaction, &new_tx.id);
            if queries::tx_exists(conn, &new_tx.id)? {
                return Err(duplicate());
            }

            let mut missing_bundle = None;
            if let Some(b_id) = &new_tx.bundle_id {
                let err = LedgerError::foreign_key(Entity::Transaction, Entity::Bundle, b_id);
                if !queries::bundle_exists_for_share(conn, b_id)? {
                    return Err(err);
                }
                missing_bundle = Some(err);
            }

            queries::insert_tx(conn, &new_tx)
                .map_err(|err| classify(err, Some(duplicate()), missing_bundle))
        })
    }

    fn update_transaction(&self, tx_id: &str, changes: TransactionChanges) -> Result<Transaction> {
        check_identifier("id", tx_id)?;
        changes.validate()?;

        self.write(|conn| {
            let current = queries::lock_tx(conn, tx_id)?
                .ok_or_else(|| LedgerError::not_found(Entity::Transaction, tx_id))?;

            let mut missing_bundle = None;
            if let Some(b_id) = changes.new_bundle_id() {
                let err = LedgerError::foreign_key(Entity::Transaction, Entity::Bundle, b_id);
                if !queries::bundle_exists_for_share(conn, b_id)? {
                    return Err(err);
                }
                missing_bundle = Some(err);
            }

            if changes.is_empty() {
                return Ok(current);
            }

            queries::update_tx(conn, tx_id, &changes)
                .map_err(|err| classify(err, None, missing_bundle))
        })
    }

    fn get_transaction(&self, tx_id: &str) -> Result<Transaction> {
        check_identifier("id", tx_id)?;

        queries::get_tx(&*self.connection()?, tx_id)?
            .ok_or_else(|| LedgerError::not_found(Entity::Transaction, tx_id))
    }

    fn transactions_by_epoch_after(&self, epoch: Epoch, page: &Page) -> Result<Vec<Transaction>> {
        page.validate()?;

        Ok(queries::get_txs_by_epoch(&*self.connection()?, epoch, page)?)
    }

    fn transactions_in_bundle(&self, b_id: &str) -> Result<Vec<Transaction>> {
        check_identifier("bundle_id", b_id)?;

        Ok(queries::get_bundle_txs(&*self.connection()?, b_id)?)
    }

    fn unvalidated_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(queries::get_unvalidated_txs(&*self.connection()?)?)
    }

    fn count_transactions(&self) -> Result<i64> {
        Ok(queries::count_txs(&*self.connection()?)?)
    }

    fn counts(&self) -> Result<LedgerCounts> {
        Ok(queries::count_all(&*self.connection()?)?)
    }

    fn prune_transactions(&self, current: Epoch, retain: u128) -> Result<usize> {
        let keep = retained_epochs(current, retain)?;

        let deleted = self.write(|conn| Ok(queries::delete_txs_outside(conn, keep)?))?;
        info!(
            "Deleted {} transactions outside the last {} epochs up to {}",
            deleted, retain, current
        );
        Ok(deleted)
    }

    fn create_validator(&self, new_validator: NewValidator) -> Result<Validator> {
        new_validator.validate()?;

        self.write(|conn| {
            let duplicate = || LedgerError::duplicate(Entity::Validator, &new_validator.address);
            if queries::get_validator(conn, &new_validator.address)?.is_some() {
                return Err(duplicate());
            }

            queries::insert_validator(conn, &new_validator)
                .map_err(|err| classify(err, Some(duplicate()), None))
        })
    }

    fn get_validator(&self, address: &str) -> Result<Validator> {
        check_identifier("address", address)?;

        queries::get_validator(&*self.connection()?, address)?
            .ok_or_else(|| LedgerError::not_found(Entity::Validator, address))
    }

    fn validators(&self) -> Result<Vec<Validator>> {
        Ok(queries::get_validators(&*self.connection()?)?)
    }

    fn delete_validator(&self, address: &str) -> Result<()> {
        check_identifier("address", address)?;

        self.write(|conn| {
            let referenced = || LedgerError::foreign_key(Entity::Leader, Entity::Validator, address);
            if queries::lock_validator(conn, address)?.is_none() {
                return Err(LedgerError::not_found(Entity::Validator, address));
            }
            if queries::get_leader(conn, address)?.is_some() {
                return Err(referenced());
            }

            queries::delete_validator(conn, address)
                .map(|_| ())
                .map_err(|err| classify(err, None, Some(referenced())))
        })
    }

    fn create_leader(&self, address: &str) -> Result<Leader> {
        check_identifier("address", address)?;

        self.write(|conn| {
            let missing_validator =
                || LedgerError::foreign_key(Entity::Leader, Entity::Validator, address);
            let duplicate = || LedgerError::duplicate(Entity::Leader, address);
            if !queries::validator_exists_for_share(conn, address)? {
                return Err(missing_validator());
            }
            if queries::get_leader(conn, address)?.is_some() {
                return Err(duplicate());
            }

            let leader = Leader {
                address: address.to_owned(),
            };
            queries::insert_leader(conn, &leader)
                .map_err(|err| classify(err, Some(duplicate()), Some(missing_validator())))
        })
    }

    fn get_leader(&self, address: &str) -> Result<Leader> {
        check_identifier("address", address)?;

        queries::get_leader(&*self.connection()?, address)?
            .ok_or_else(|| LedgerError::not_found(Entity::Leader, address))
    }

    fn leaders(&self) -> Result<Vec<Leader>> {
        Ok(queries::get_leaders(&*self.connection()?)?)
    }

    fn delete_leader(&self, address: &str) -> Result<()> {
        check_identifier("address", address)?;

        self.write(|conn| match queries::delete_leader(conn, address)? {
            0 => Err(LedgerError::not_found(Entity::Leader, address)),
            _ => Ok(()),
        })
    }
}
