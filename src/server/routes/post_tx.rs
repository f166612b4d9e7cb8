use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    database::models::{NewTransaction, TransactionChanges},
    ledger::Ledger,
    server::{error::LedgerServerError, with_ledger, RuntimeContext},
    types::{decode_base64url, Block, Epoch},
};

#[derive(Debug, Deserialize)]
pub struct PostTxBody {
    id: String,
    epoch: Epoch,
    block_promised: Block,
    #[serde(default)]
    block_actual: Option<Block>,
    /// base64url, unpadded
    signature: String,
    #[serde(default)]
    validated: bool,
    #[serde(default)]
    bundle_id: Option<String>,
}

/// Absent fields are left alone; an explicit `null` clears the nullable ones.
#[derive(Debug, Default, Deserialize)]
pub struct PatchTxBody {
    #[serde(default)]
    epoch: Option<Epoch>,
    #[serde(default)]
    block_promised: Option<Block>,
    #[serde(default, deserialize_with = "nullable")]
    block_actual: Option<Option<Block>>,
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    validated: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    bundle_id: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PruneBody {
    current_epoch: Epoch,
    retain: u64,
}

#[derive(Serialize)]
struct PruneResult {
    deleted: usize,
}

fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub async fn post_tx<Context>(
    ctx: Data<Context>,
    body: Json<PostTxBody>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let body = body.into_inner();
    let new_tx = NewTransaction {
        id: body.id,
        epoch: body.epoch,
        block_promised: body.block_promised,
        block_actual: body.block_actual,
        signature: decode_base64url("signature", &body.signature)?,
        validated: body.validated,
        bundle_id: body.bundle_id,
    };

    let tx = with_ledger(ctx, move |ledger| ledger.create_transaction(new_tx)).await?;
    Ok(HttpResponse::Created().json(tx))
}

pub async fn patch_tx<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
    body: Json<PatchTxBody>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (tx_id,) = path.into_inner();
    let body = body.into_inner();

    let signature = match body.signature {
        Some(s) => Some(decode_base64url("signature", &s)?),
        None => None,
    };
    let changes = TransactionChanges {
        epoch: body.epoch,
        block_promised: body.block_promised,
        block_actual: body.block_actual,
        signature,
        validated: body.validated,
        bundle_id: body.bundle_id,
    };

    let tx = with_ledger(ctx, move |ledger| {
        ledger.update_transaction(&tx_id, changes)
    })
    .await?;
    Ok(HttpResponse::Ok().json(tx))
}

pub async fn prune<Context>(
    ctx: Data<Context>,
    body: Json<PruneBody>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let PruneBody {
        current_epoch,
        retain,
    } = body.into_inner();

    let deleted = with_ledger(ctx, move |ledger| {
        ledger.prune_transactions(current_epoch, u128::from(retain))
    })
    .await?;
    Ok(HttpResponse::Ok().json(PruneResult { deleted }))
}
