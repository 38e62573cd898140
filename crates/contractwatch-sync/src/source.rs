use std::sync::Arc;

use async_trait::async_trait;
use contractwatch_core::Contract;

use crate::SyncError;

/// Anything that can produce the current contract list, newest first.
#[async_trait]
pub trait ContractSource: Send + Sync {
    async fn list_contracts(&self) -> Result<Vec<Contract>, SyncError>;
}

#[async_trait]
impl<T: ContractSource + ?Sized> ContractSource for Arc<T> {
    async fn list_contracts(&self) -> Result<Vec<Contract>, SyncError> {
        (**self).list_contracts().await
    }
}
