use actix_web::{
    web::{Data, Json, Path},
    HttpResponse,
};
use serde::Deserialize;

use crate::{
    ledger::Ledger,
    server::{error::LedgerServerError, with_ledger, RuntimeContext},
};

#[derive(Debug, Deserialize)]
pub struct PostLeaderBody {
    address: String,
}

pub async fn post_leader<Context>(
    ctx: Data<Context>,
    body: Json<PostLeaderBody>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let PostLeaderBody { address } = body.into_inner();
    let leader = with_ledger(ctx, move |ledger| ledger.create_leader(&address)).await?;
    Ok(HttpResponse::Created().json(leader))
}

pub async fn get_leaders<Context>(
    ctx: Data<Context>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let leaders = with_ledger(ctx, |ledger| ledger.leaders()).await?;
    Ok(HttpResponse::Ok().json(leaders))
}

pub async fn get_leader<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (address,) = path.into_inner();
    let leader = with_ledger(ctx, move |ledger| ledger.get_leader(&address)).await?;
    Ok(HttpResponse::Ok().json(leader))
}

pub async fn delete_leader<Context>(
    ctx: Data<Context>,
    path: Path<(String,)>,
) -> actix_web::Result<HttpResponse, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    let (address,) = path.into_inner();
    with_ledger(ctx, move |ledger| ledger.delete_leader(&address)).await?;
    Ok(HttpResponse::NoContent().finish())
}
