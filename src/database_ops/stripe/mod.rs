pub mod provider;

pub use provider::StripeProvider;

use crate::catalog::error::RegistrarError;
use crate::catalog::record::{GameRecord, PriceId};

/// Mints a priced product on the payment service for one record.
///
/// Not idempotent: every call creates a new remote resource.
#[async_trait::async_trait]
pub trait PriceRegistrar: Send + Sync {
    async fn register_price(&self, record: &GameRecord) -> Result<PriceId, RegistrarError>;
}
