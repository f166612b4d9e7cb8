use actix_web::{
    web::{Data, Path, Query},
    HttpResponse,
};

use crate::{
    ledger::{Ledger, Page},
    server::{error::LedgerServerError, with_ledger, RuntimeContext},
    types::Epoch,
};

pub async fn get_tx<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (tx_id,) = path.into_inner();
    let tx = with_ledger(ctx, move |ledger| ledger.get_transaction(&tx_id)).await?;
    Ok(HttpResponse::Ok().json(tx))
}

pub async fn get_epoch_txs<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
    page: Query<Page>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let epoch: Epoch = path.into_inner().0.parse()?;
    let page = page.into_inner();

    let txs = with_ledger(ctx, move |ledger| {
        ledger.transactions_by_epoch_after(epoch, &page)
    })
    .await?;
    Ok(HttpResponse::Ok().json(txs))
}

pub async fn get_unvalidated_txs<Context>(
    ctx: Data<Context>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let txs = with_ledger(ctx, |ledger| ledger.unvalidated_transactions()).await?;
    Ok(HttpResponse::Ok().json(txs))
}
