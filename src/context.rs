use std::net::SocketAddr;

use crate::{database::PgLedger, ledger::Ledger, server::RuntimeContext};

#[derive(Clone)]
pub struct AppContext<L = PgLedger> {
    ledger: L,
    listen: SocketAddr,
}

impl<L> AppContext<L>
where
    L: Ledger,
{
    pub fn new(ledger: L, listen: SocketAddr) -> Self {
        Self { ledger, listen }
    }
}

impl<L> RuntimeContext for AppContext<L>
where
    L: Ledger,
{
    type Ledger = L;

    fn bind_address(&self) -> &SocketAddr {
        &self.listen
    }

    fn ledger(&self) -> &L {
        &self.ledger
    }
}
