use actix_web::{web::Data, HttpResponse};
use serde::Serialize;

use crate::{
    database::models::LedgerCounts,
    ledger::Ledger,
    server::{error::LedgerServerError, with_ledger, RuntimeContext},
};

#[derive(Serialize)]
struct StatusBody {
    total_txs: i64,
    validators: i64,
    leaders: i64,
}

impl From<LedgerCounts> for StatusBody {
    fn from(counts: LedgerCounts) -> Self {
        StatusBody {
            total_txs: counts.transactions,
            validators: counts.validators,
            leaders: counts.leaders,
        }
    }
}

pub async fn status<Context>(ctx: Data<Context>) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let counts = with_ledger(ctx, |ledger| ledger.counts()).await?;
    Ok(HttpResponse::Ok().json(StatusBody::from(counts)))
}
