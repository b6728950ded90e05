use tradepost_auth::{Action, Actor, Resource, enforce};
use tradepost_core::{DomainResult, KeywordId};
use tradepost_marketplace::{Keyword, MarketEvent};

use crate::Marketplace;
use crate::store::{Change, ChangeSet};

impl Marketplace {
    /// Any user may add a keyword; every global admin hears about it.
    pub fn create_keyword(&self, actor: &Actor, name: &str) -> DomainResult<Keyword> {
        let keyword = Keyword::new(name, self.now())?;
        self.store.commit(ChangeSet::new().with(Change::PutKeyword(keyword.clone())))?;

        tracing::info!(keyword_id = %keyword.id, name = %keyword.name, actor = %actor.id, "keyword added");
        self.publish(MarketEvent::KeywordAdded {
            keyword: keyword.clone(),
            created_by: actor.id,
            occurred_at: self.now(),
        });
        Ok(keyword)
    }

    /// Global admins only. The keyword is also dropped from every card.
    pub fn delete_keyword(&self, actor: &Actor, id: KeywordId) -> DomainResult<()> {
        enforce(actor, Action::ManageKeywords, Resource::Marketplace)?;
        self.store.commit(ChangeSet::new().with(Change::DeleteKeyword(id)))?;
        tracing::info!(keyword_id = %id, actor = %actor.id, "keyword deleted");
        Ok(())
    }
}
