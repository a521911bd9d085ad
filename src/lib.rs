//! Catalog seeding: read games from a CSV export, mint a price for each on
//! the payment service, and append the priced game to the catalog store.
//!
//! One row is fully resolved before the next is read. A row that fails to
//! parse, price, or persist is logged and skipped; only an unreadable input
//! aborts the run.

pub mod catalog;
pub mod database_ops;
pub mod logging;

pub mod util {
    pub mod env;
}
