use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entity {
    Bundle,
    Transaction,
    Validator,
    Leader,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Entity::Bundle => "bundle",
            Entity::Transaction => "transaction",
            Entity::Validator => "validator",
            Entity::Leader => "leader",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LedgerError {
    #[error("{entity} {key} already exists")]
    DuplicateKey { entity: Entity, key: String },

    /// `key` names the `references` row that is missing, or, for deletes,
    /// the row that is still referenced by an `entity`.
    #[error("{entity} violates foreign key on {references} {key}")]
    ForeignKeyViolation {
        entity: Entity,
        references: Entity,
        key: String,
    },

    #[error("{entity} {key} not found")]
    NotFound { entity: Entity, key: String },

    #[error("malformed {field}: {reason}")]
    MalformedInput { field: &'static str, reason: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::MalformedInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn duplicate(entity: Entity, key: &str) -> Self {
        LedgerError::DuplicateKey {
            entity,
            key: key.to_owned(),
        }
    }

    pub fn not_found(entity: Entity, key: &str) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_owned(),
        }
    }

    pub fn foreign_key(entity: Entity, references: Entity, key: &str) -> Self {
        LedgerError::ForeignKeyViolation {
            entity,
            references,
            key: key.to_owned(),
        }
    }
}
