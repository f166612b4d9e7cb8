use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::result::Error;
use diesel::sql_types::{Bool, Text};
use diesel::PgConnection;

use crate::database::models::{
    Bundle, Leader, LedgerCounts, NewBundle, NewTransaction, NewValidator, Transaction, TransactionChanges,
    Validator,
};
use crate::database::schema::{bundle, leaders, transactions, validators};
use crate::ledger::Page;
use crate::types::Epoch;

// Keys sort bytewise like the in-memory ledger, whatever the database's
// default collation is.
const TX_ID_BYTEWISE: &str = r#"transactions.id COLLATE "C""#;
const VALIDATOR_ADDRESS_BYTEWISE: &str = r#"validators.address COLLATE "C""#;
const LEADER_ADDRESS_BYTEWISE: &str = r#"leaders.address COLLATE "C""#;

pub fn get_bundle(conn: &PgConnection, b_id: &str) -> Result<Option<Bundle>, Error> {
    bundle::table.find(b_id).first::<Bundle>(conn).optional()
}

/// Locks the bundle against deletion until the surrounding transaction ends.
pub fn bundle_exists_for_share(conn: &PgConnection, b_id: &str) -> Result<bool, Error> {
    bundle::table
        .find(b_id)
        .select(bundle::id)
        .for_share()
        .get_result::<String>(conn)
        .optional()
        .map(|row| row.is_some())
}

pub fn lock_bundle(conn: &PgConnection, b_id: &str) -> Result<Option<Bundle>, Error> {
    bundle::table
        .find(b_id)
        .for_update()
        .get_result::<Bundle>(conn)
        .optional()
}

pub fn insert_bundle(conn: &PgConnection, new_bundle: &NewBundle) -> Result<Bundle, Error> {
    diesel::insert_into(bundle::table)
        .values(new_bundle)
        .get_result(conn)
}

pub fn delete_bundle(conn: &PgConnection, b_id: &str) -> Result<usize, Error> {
    diesel::delete(bundle::table.find(b_id)).execute(conn)
}

pub fn count_bundle_txs(conn: &PgConnection, b_id: &str) -> Result<i64, Error> {
    transactions::table
        .filter(transactions::bundle_id.eq(b_id))
        .count()
        .get_result(conn)
}

pub fn get_tx(conn: &PgConnection, tx_id: &str) -> Result<Option<Transaction>, Error> {
    transactions::table
        .find(tx_id)
        .first::<Transaction>(conn)
        .optional()
}

pub fn lock_tx(conn: &PgConnection, tx_id: &str) -> Result<Option<Transaction>, Error> {
    transactions::table
        .find(tx_id)
        .for_update()
        .get_result::<Transaction>(conn)
        .optional()
}

pub fn tx_exists(conn: &PgConnection, tx_id: &str) -> Result<bool, Error> {
    transactions::table
        .find(tx_id)
        .select(transactions::id)
        .first::<String>(conn)
        .optional()
        .map(|row| row.is_some())
}

pub fn insert_tx(conn: &PgConnection, new_tx: &NewTransaction) -> Result<Transaction, Error> {
    diesel::insert_into(transactions::table)
        .values(new_tx)
        .get_result(conn)
}

pub fn update_tx(
    conn: &PgConnection,
    tx_id: &str,
    changes: &TransactionChanges,
) -> Result<Transaction, Error> {
    diesel::update(transactions::table.find(tx_id))
        .set(changes)
        .get_result(conn)
}

pub fn get_txs_by_epoch(
    conn: &PgConnection,
    epoch: Epoch,
    page: &Page,
) -> Result<Vec<Transaction>, Error> {
    let mut query = transactions::table
        .filter(transactions::epoch.eq(epoch))
        .order(sql::<Text>(TX_ID_BYTEWISE))
        .into_boxed();

    if let Some(after) = &page.after {
        let cursor = format!("{} > ", TX_ID_BYTEWISE);
        query = query.filter(sql::<Bool>(&cursor).bind::<Text, _>(after.as_str()));
    }
    if let Some(limit) = page.limit {
        query = query.limit(limit);
    }

    query.load::<Transaction>(conn)
}

pub fn get_bundle_txs(conn: &PgConnection, b_id: &str) -> Result<Vec<Transaction>, Error> {
    transactions::table
        .filter(transactions::bundle_id.eq(b_id))
        .order(sql::<Text>(TX_ID_BYTEWISE))
        .load::<Transaction>(conn)
}

pub fn get_unvalidated_txs(conn: &PgConnection) -> Result<Vec<Transaction>, Error> {
    transactions::table
        .filter(transactions::validated.eq(false))
        .order(sql::<Text>(TX_ID_BYTEWISE))
        .load::<Transaction>(conn)
}

pub fn count_txs(conn: &PgConnection) -> Result<i64, Error> {
    transactions::table.count().get_result(conn)
}

pub fn count_all(conn: &PgConnection) -> Result<LedgerCounts, Error> {
    diesel::sql_query(
        "SELECT (SELECT count(*) FROM transactions) AS transactions, \
                (SELECT count(*) FROM validators) AS validators, \
                (SELECT count(*) FROM leaders) AS leaders",
    )
    .get_result(conn)
}

pub fn delete_txs_outside(conn: &PgConnection, keep: Vec<Epoch>) -> Result<usize, Error> {
    if keep.is_empty() {
        return diesel::delete(transactions::table).execute(conn);
    }

    diesel::delete(transactions::table.filter(transactions::epoch.ne_all(keep))).execute(conn)
}

pub fn get_validator(conn: &PgConnection, address: &str) -> Result<Option<Validator>, Error> {
    validators::table
        .find(address)
        .first::<Validator>(conn)
        .optional()
}

/// Locks the validator against deletion until the surrounding transaction ends.
pub fn validator_exists_for_share(conn: &PgConnection, address: &str) -> Result<bool, Error> {
    validators::table
        .find(address)
        .select(validators::address)
        .for_share()
        .get_result::<String>(conn)
        .optional()
        .map(|row| row.is_some())
}

pub fn lock_validator(conn: &PgConnection, address: &str) -> Result<Option<Validator>, Error> {
    validators::table
        .find(address)
        .for_update()
        .get_result::<Validator>(conn)
        .optional()
}

pub fn get_validators(conn: &PgConnection) -> Result<Vec<Validator>, Error> {
    validators::table
        .order(sql::<Text>(VALIDATOR_ADDRESS_BYTEWISE))
        .load::<Validator>(conn)
}

pub fn insert_validator(
    conn: &PgConnection,
    new_validator: &NewValidator,
) -> Result<Validator, Error> {
    diesel::insert_into(validators::table)
        .values(new_validator)
        .get_result(conn)
}

pub fn delete_validator(conn: &PgConnection, address: &str) -> Result<usize, Error> {
    diesel::delete(validators::table.find(address)).execute(conn)
}

pub fn get_leader(conn: &PgConnection, address: &str) -> Result<Option<Leader>, Error> {
    leaders::table.find(address).first::<Leader>(conn).optional()
}

pub fn get_leaders(conn: &PgConnection) -> Result<Vec<Leader>, Error> {
    leaders::table
        .order(sql::<Text>(LEADER_ADDRESS_BYTEWISE))
        .load::<Leader>(conn)
}

pub fn insert_leader(conn: &PgConnection, leader: &Leader) -> Result<Leader, Error> {
    diesel::insert_into(leaders::table)
        .values(leader)
        .get_result(conn)
}

pub fn delete_leader(conn: &PgConnection, address: &str) -> Result<usize, Error> {
    diesel::delete(leaders::table.find(address)).execute(conn)
}
