#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

pub mod consts;
pub mod context;
pub mod database;
pub mod ledger;
pub mod server;
pub mod types;
