use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use serde::Deserialize;

use crate::{
    database::models::NewBundle,
    ledger::Ledger,
    server::{error::LedgerServerError, with_ledger, RuntimeContext},
    types::Block,
};

#[derive(Debug, Deserialize)]
pub struct PostBundleBody {
    id: String,
    owner_address: String,
    block_height: Block,
}

pub async fn post_bundle<Context>(
    ctx: Data<Context>,
    body: Json<PostBundleBody>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let body = body.into_inner();
    let new_bundle = NewBundle {
        id: body.id,
        owner_address: body.owner_address,
        block_height: body.block_height,
    };

    let b = with_ledger(ctx, move |ledger| ledger.create_bundle(new_bundle)).await?;
    Ok(HttpResponse::Created().json(b))
}

pub async fn get_bundle<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (b_id,) = path.into_inner();
    let b = with_ledger(ctx, move |ledger| ledger.get_bundle(&b_id)).await?;
    Ok(HttpResponse::Ok().json(b))
}

pub async fn delete_bundle<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (b_id,) = path.into_inner();
    with_ledger(ctx, move |ledger| ledger.delete_bundle(&b_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_bundle_txs<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (b_id,) = path.into_inner();
    let txs = with_ledger(ctx, move |ledger| ledger.transactions_in_bundle(&b_id)).await?;
    Ok(HttpResponse::Ok().json(txs))
}
