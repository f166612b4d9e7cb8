use diesel::sql_types::BigInt;
use serde::Serialize;

use super::schema::{bundle, leaders, transactions, validators};
use crate::{
    ledger::error::LedgerError,
    types::{check_identifier, check_url, serialize_base64url, Block, Epoch},
};

#[derive(Clone, Debug, Eq, PartialEq, Queryable, Serialize)]
pub struct Bundle {
    pub id: String,
    pub owner_address: String,
    pub block_height: Block,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "bundle"]
pub struct NewBundle {
    pub id: String,
    pub owner_address: String,
    pub block_height: Block,
}

impl NewBundle {
    pub fn validate(&self) -> Result<(), LedgerError> {
        check_identifier("id", &self.id)?;
        check_identifier("owner_address", &self.owner_address)
    }
}

impl From<NewBundle> for Bundle {
    fn from(b: NewBundle) -> Self {
        Bundle {
            id: b.id,
            owner_address: b.owner_address,
            block_height: b.block_height,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Queryable, Serialize)]
pub struct Transaction {
    pub id: String,
    pub epoch: Epoch,
    pub block_promised: Block,
    pub block_actual: Option<Block>,
    #[serde(serialize_with = "serialize_base64url")]
    pub signature: Vec<u8>,
    pub validated: bool,
    pub bundle_id: Option<String>,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "transactions"]
pub struct NewTransaction {
    pub id: String,
    pub epoch: Epoch,
    pub block_promised: Block,
    pub block_actual: Option<Block>,
    pub signature: Vec<u8>,
    pub validated: bool,
    pub bundle_id: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<(), LedgerError> {
        check_identifier("id", &self.id)?;
        if let Some(b_id) = &self.bundle_id {
            check_identifier("bundle_id", b_id)?;
        }
        Ok(())
    }
}

impl From<NewTransaction> for Transaction {
    fn from(tx: NewTransaction) -> Self {
        Transaction {
            id: tx.id,
            epoch: tx.epoch,
            block_promised: tx.block_promised,
            block_actual: tx.block_actual,
            signature: tx.signature,
            validated: tx.validated,
            bundle_id: tx.bundle_id,
        }
    }
}

/// Partial update of a transaction.
///
/// `None` leaves a column untouched. For the nullable columns `Some(None)`
/// clears the value.
#[derive(AsChangeset, Clone, Debug, Default)]
#[table_name = "transactions"]
pub struct TransactionChanges {
    pub epoch: Option<Epoch>,
    pub block_promised: Option<Block>,
    pub block_actual: Option<Option<Block>>,
    pub signature: Option<Vec<u8>>,
    pub validated: Option<bool>,
    pub bundle_id: Option<Option<String>>,
}

impl TransactionChanges {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if let Some(Some(b_id)) = &self.bundle_id {
            check_identifier("bundle_id", b_id)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.epoch.is_none()
            && self.block_promised.is_none()
            && self.block_actual.is_none()
            && self.signature.is_none()
            && self.validated.is_none()
            && self.bundle_id.is_none()
    }

    /// Bundle the transaction must reference after the update, if it changes.
    pub fn new_bundle_id(&self) -> Option<&str> {
        match &self.bundle_id {
            Some(Some(b_id)) => Some(b_id.as_str()),
            _ => None,
        }
    }

    pub fn apply(self, tx: &mut Transaction) {
        if let Some(epoch) = self.epoch {
            tx.epoch = epoch;
        }
        if let Some(block) = self.block_promised {
            tx.block_promised = block;
        }
        if let Some(block) = self.block_actual {
            tx.block_actual = block;
        }
        if let Some(signature) = self.signature {
            tx.signature = signature;
        }
        if let Some(validated) = self.validated {
            tx.validated = validated;
        }
        if let Some(b_id) = self.bundle_id {
            tx.bundle_id = b_id;
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Queryable, Serialize)]
pub struct Validator {
    pub address: String,
    pub url: Option<String>,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "validators"]
pub struct NewValidator {
    pub address: String,
    pub url: Option<String>,
}

impl NewValidator {
    pub fn validate(&self) -> Result<(), LedgerError> {
        check_identifier("address", &self.address)?;
        if let Some(url) = &self.url {
            check_url(url)?;
        }
        Ok(())
    }
}

impl From<NewValidator> for Validator {
    fn from(v: NewValidator) -> Self {
        Validator {
            address: v.address,
            url: v.url,
        }
    }
}

#[derive(Clone, Debug, Eq, Insertable, PartialEq, Queryable, Serialize)]
#[table_name = "leaders"]
pub struct Leader {
    pub address: String,
}

/// Row counts read in one statement, so they describe a single snapshot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, QueryableByName, Serialize)]
pub struct LedgerCounts {
    #[sql_type = "BigInt"]
    pub transactions: i64,
    #[sql_type = "BigInt"]
    pub validators: i64,
    #[sql_type = "BigInt"]
    pub leaders: i64,
}
