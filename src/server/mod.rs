pub mod error;
pub mod routes;

use std::net::SocketAddr;

use actix_web::{
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};
use log::info;

use crate::ledger::{self, Ledger};

use self::{
    error::LedgerServerError,
    routes::{bundle, get_tx, index::index, leader, post_tx, status::status, validator},
};

pub trait RuntimeContext {
    type Ledger: Ledger;

    fn bind_address(&self) -> &SocketAddr;
    fn ledger(&self) -> &Self::Ledger;
}

/// Runs a ledger call on the blocking pool; diesel connections are
/// synchronous and must stay off the event loop.
pub(crate) async fn with_ledger<Context, T, F>(
    ctx: Data<Context>,
    f: F,
) -> Result<T, LedgerServerError>
where
    Context: RuntimeContext + Send + Sync + 'static,
    F: FnOnce(&Context::Ledger) -> ledger::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let res = actix_rt::task::spawn_blocking(move || f(ctx.ledger())).await?;
    Ok(res?)
}

pub fn configure<Context>(cfg: &mut web::ServiceConfig)
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    cfg.route("/", web::get().to(index))
        .route("/status", web::get().to(status::<Context>))
        .route("/prune", web::post().to(post_tx::prune::<Context>))
        .service(
            web::scope("/bundle")
                .route("", web::post().to(bundle::post_bundle::<Context>))
                .route("/{id}", web::get().to(bundle::get_bundle::<Context>))
                .route("/{id}", web::delete().to(bundle::delete_bundle::<Context>))
                .route("/{id}/tx", web::get().to(bundle::get_bundle_txs::<Context>)),
        )
        .service(
            web::scope("/tx")
                .route("", web::post().to(post_tx::post_tx::<Context>))
                .route(
                    "/unvalidated",
                    web::get().to(get_tx::get_unvalidated_txs::<Context>),
                )
                .route("/{id}", web::get().to(get_tx::get_tx::<Context>))
                .route("/{id}", web::patch().to(post_tx::patch_tx::<Context>)),
        )
        .service(
            web::scope("/epoch")
                .route("/{epoch}/tx", web::get().to(get_tx::get_epoch_txs::<Context>)),
        )
        .service(
            web::scope("/validator")
                .route("", web::post().to(validator::post_validator::<Context>))
                .route("", web::get().to(validator::get_validators::<Context>))
                .route("/{address}", web::get().to(validator::get_validator::<Context>))
                .route(
                    "/{address}",
                    web::delete().to(validator::delete_validator::<Context>),
                ),
        )
        .service(
            web::scope("/leader")
                .route("", web::post().to(leader::post_leader::<Context>))
                .route("", web::get().to(leader::get_leaders::<Context>))
                .route("/{address}", web::get().to(leader::get_leader::<Context>))
                .route("/{address}", web::delete().to(leader::delete_leader::<Context>)),
        );
}

pub async fn run_server<Context>(ctx: Context) -> std::io::Result<()>
where
    Context: RuntimeContext + Send + Sync + 'static,
{
    info!("Starting up HTTP server...");

    let bind_address = *ctx.bind_address();
    let data = Data::new(ctx);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Logger::default())
            .configure(configure::<Context>)
    })
    .shutdown_timeout(5)
    .bind(bind_address)?
    .run()
    .await
}
