use std::{fmt, io::Write, str::FromStr};

use data_encoding::{BASE64URL_NOPAD, HEXLOWER_PERMISSIVE};
use diesel::{
    deserialize::{self, FromSql},
    pg::Pg,
    r2d2::{ConnectionManager, Pool},
    serialize::{self, IsNull, Output, ToSql},
    sql_types::Binary,
    PgConnection,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::{
    consts::{BINARY_INTEGER_MAX_BYTES, IDENTIFIER_LENGTH, MAX_URL_LENGTH},
    ledger::error::LedgerError,
};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Unsigned integers persisted as `BYTEA`.
///
/// Values are written big-endian in minimal form (no leading zero bytes, zero
/// is a single `0x00`), so two stored values are byte-equal exactly when they
/// are numerically equal. Reading accepts leading zeros as long as the value
/// fits in 128 bits.
macro_rules! binary_integer {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(
            AsExpression, FromSqlRow, Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd,
        )]
        #[sql_type = "Binary"]
        pub struct $name(pub u128);

        impl $name {
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
                decode_u128($field, bytes).map($name)
            }

            pub fn to_bytes(&self) -> Vec<u8> {
                encode_u128(self.0)
            }
        }

        impl From<u128> for $name {
            fn from(value: u128) -> Self {
                $name(value)
            }
        }

        impl PartialEq<u128> for $name {
            fn eq(&self, other: &u128) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_u128($field, s).map($name)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s: String = de::Deserialize::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }

        impl ToSql<Binary, Pg> for $name {
            fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
                out.write_all(&self.to_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Binary, Pg> for $name {
            fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
                let bytes = bytes.ok_or("unexpected null for binary integer")?;
                Ok(Self::from_bytes(bytes)?)
            }
        }
    };
}

binary_integer!(
    /// Logical time period transactions are indexed by.
    Epoch,
    "epoch"
);

binary_integer!(
    /// Block height, promised or actual.
    Block,
    "block"
);

fn decode_u128(field: &'static str, bytes: &[u8]) -> Result<u128, LedgerError> {
    if bytes.is_empty() {
        return Err(LedgerError::malformed(field, "empty binary integer"));
    }

    let start = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len());
    let significant = &bytes[start..];

    if significant.len() > BINARY_INTEGER_MAX_BYTES {
        return Err(LedgerError::malformed(
            field,
            format!("{} significant bytes, at most 16 allowed", significant.len()),
        ));
    }

    Ok(significant
        .iter()
        .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

fn encode_u128(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

/// Accepts a decimal number or `0x`-prefixed hex bytes.
fn parse_u128(field: &'static str, s: &str) -> Result<u128, LedgerError> {
    match s.strip_prefix("0x") {
        Some(hex) => {
            let bytes = HEXLOWER_PERMISSIVE
                .decode(hex.as_bytes())
                .map_err(|err| LedgerError::malformed(field, err.to_string()))?;
            decode_u128(field, &bytes)
        }
        None => s
            .parse::<u128>()
            .map_err(|err| LedgerError::malformed(field, err.to_string())),
    }
}

/// Addresses and ids are 43 base64url characters (a 256 bit hash, unpadded).
pub fn check_identifier(field: &'static str, value: &str) -> Result<(), LedgerError> {
    let length = value.chars().count();
    if length != IDENTIFIER_LENGTH {
        return Err(LedgerError::malformed(
            field,
            format!("expected {} characters, got {}", IDENTIFIER_LENGTH, length),
        ));
    }

    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(LedgerError::malformed(
            field,
            format!("invalid character {:?}", c),
        ));
    }

    Ok(())
}

pub fn check_url(value: &str) -> Result<(), LedgerError> {
    let length = value.chars().count();
    if length > MAX_URL_LENGTH {
        return Err(LedgerError::malformed(
            "url",
            format!("{} characters, at most {} allowed", length, MAX_URL_LENGTH),
        ));
    }

    // Url::parse lets NUL and other control characters through
    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(LedgerError::malformed(
            "url",
            format!("invalid character {:?}", c),
        ));
    }

    Url::parse(value)
        .map(|_| ())
        .map_err(|err| LedgerError::malformed("url", err.to_string()))
}

pub fn serialize_base64url<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64URL_NOPAD.encode(bytes))
}

pub fn decode_base64url(field: &'static str, value: &str) -> Result<Vec<u8>, LedgerError> {
    BASE64URL_NOPAD
        .decode(value.as_bytes())
        .map_err(|err| LedgerError::malformed(field, err.to_string()))
}
