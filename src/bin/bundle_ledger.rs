use std::net::SocketAddr;

use anyhow::Context as _;
use clap::Parser;
use env_logger::Env;
use log::info;

use bundle_ledger::{
    consts::DEFAULT_POOL_SIZE, context::AppContext, database::PgLedger, server::run_server,
};

#[derive(Clone, Debug, Parser)]
#[clap(version, about)]
struct CliOpts {
    /// Database connection URL
    #[clap(long, env)]
    database_url: String,

    /// Listen address for the server
    #[clap(short, long, env, default_value = "0.0.0.0:42069")]
    listen: SocketAddr,

    /// Maximum number of pooled database connections
    #[clap(long, env = "DB_POOL_SIZE", default_value_t = DEFAULT_POOL_SIZE)]
    pool_size: u32,

    /// Apply pending schema migrations before serving
    #[clap(long)]
    migrate: bool,
}

fn main() -> anyhow::Result<()> {
    actix_rt::System::new().block_on(async {
        dotenv::dotenv().ok();

        env_logger::init_from_env(Env::default().default_filter_or("info"));

        let config = CliOpts::parse();

        let ledger = PgLedger::connect(&config.database_url, config.pool_size)
            .context("Failed to create database connection pool")?;

        if config.migrate {
            ledger.migrate().context("Failed to run migrations")?;
        }

        let ctx = AppContext::new(ledger, config.listen);

        info!("Listening on {}", config.listen);
        run_server(ctx).await.context("HTTP server failed")
    })
}
