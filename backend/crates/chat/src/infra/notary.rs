//! Ledger notaries

use crate::domain::entity::{ApiCallRecord, LedgerReceipt};
use crate::domain::repository::LedgerNotary;
use crate::error::LedgerError;

/// Notary for deployments without ledger credentials
///
/// Every call fails with [`LedgerError::Disabled`]; chat replies go out
/// without a `blockchain` section.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotary;

impl LedgerNotary for DisabledNotary {
    async fn notarize(&self, call: &ApiCallRecord) -> Result<LedgerReceipt, LedgerError> {
        tracing::debug!(user_id = %call.user_id, "Ledger disabled, API call not notarised");
        Err(LedgerError::Disabled)
    }
}
