use std::sync::Arc;

use tradepost_auth::SystemRole;
use tradepost_core::{BusinessId, DomainResult, UserId};
use tradepost_marketplace::Business;
use tradepost_notifications::RecipientDirectory;

use crate::store::MarketStore;

/// Resolves notification recipients from the market store.
pub struct StoreDirectory {
    store: Arc<dyn MarketStore>,
}

impl StoreDirectory {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }
}

impl RecipientDirectory for StoreDirectory {
    fn global_admins(&self) -> DomainResult<Vec<UserId>> {
        let mut admins: Vec<UserId> = self
            .store
            .users_with_role(SystemRole::DefaultGlobalApplicationAdmin)?
            .into_iter()
            .chain(self.store.users_with_role(SystemRole::GlobalApplicationAdmin)?)
            .map(|u| u.id)
            .collect();
        admins.sort();
        admins.dedup();
        Ok(admins)
    }

    fn business(&self, id: BusinessId) -> DomainResult<Option<Business>> {
        self.store.business(id)
    }
}
