use tradepost_auth::{Action, Actor, Resource, enforce};
use tradepost_core::{CardId, DomainError, DomainResult, ExpectedVersion, KeywordId};
use tradepost_marketplace::{Card, Section};

use super::missing;
use crate::Marketplace;
use crate::store::{Change, ChangeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub section: Section,
    pub title: String,
    pub description: Option<String>,
    pub keywords: Vec<KeywordId>,
}

/// Fields to change on a card; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardEdit {
    pub section: Option<Section>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<KeywordId>>,
}

impl Marketplace {
    /// Post a card for the actor. Every keyword must already exist.
    pub fn create_card(&self, actor: &Actor, request: NewCard) -> DomainResult<Card> {
        let mut card = Card::new(
            actor.id,
            request.section,
            request.title,
            self.now(),
            self.config.card_display_period,
        )?
        .with_keywords(request.keywords);
        if let Some(description) = request.description {
            card = card.with_description(description);
        }

        let id = card.id;
        self.store.commit(ChangeSet::new().with(Change::PutCard {
            card,
            expected: ExpectedVersion::Exact(0),
        }))?;
        tracing::info!(card_id = %id, creator = %actor.id, "card created");
        self.load_card(id)
    }

    /// Creator or a global admin.
    pub fn edit_card(&self, actor: &Actor, id: CardId, edit: CardEdit) -> DomainResult<Card> {
        if edit.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DomainError::validation("card title cannot be empty"));
        }
        self.with_conflict_retry("edit_card", || {
            let mut card = self.live_card(id)?;
            enforce(actor, Action::Modify, Resource::Card { creator: card.creator })?;

            let expected = ExpectedVersion::Exact(card.version);
            if let Some(section) = edit.section {
                card.section = section;
            }
            if let Some(title) = &edit.title {
                card.title = title.trim().to_string();
            }
            if let Some(description) = &edit.description {
                card.description = Some(description.clone());
            }
            if let Some(keywords) = &edit.keywords {
                card.keywords = keywords.iter().copied().collect();
            }
            self.store.commit(ChangeSet::new().with(Change::PutCard { card, expected }))
        })?;
        self.load_card(id)
    }

    /// Creator or a global admin.
    pub fn delete_card(&self, actor: &Actor, id: CardId) -> DomainResult<()> {
        self.with_conflict_retry("delete_card", || {
            let card = self.load_card(id)?;
            enforce(actor, Action::Modify, Resource::Card { creator: card.creator })?;
            self.store.commit(ChangeSet::new().with(Change::DeleteCard {
                id,
                expected: ExpectedVersion::Exact(card.version),
            }))
        })?;
        tracing::info!(card_id = %id, actor = %actor.id, "card deleted");
        Ok(())
    }

    /// Restart the display period from now. Expired cards cannot be extended.
    pub fn extend_card(&self, actor: &Actor, id: CardId) -> DomainResult<Card> {
        self.with_conflict_retry("extend_card", || {
            let mut card = self.load_card(id)?;
            enforce(actor, Action::Modify, Resource::Card { creator: card.creator })?;
            let expected = ExpectedVersion::Exact(card.version);
            card.extend_display_period(self.now(), self.config.card_display_period)?;
            self.store.commit(ChangeSet::new().with(Change::PutCard { card, expected }))
        })?;
        tracing::info!(card_id = %id, actor = %actor.id, "card display period extended");
        self.load_card(id)
    }

    pub(crate) fn load_card(&self, id: CardId) -> DomainResult<Card> {
        self.store.card(id)?.ok_or_else(|| missing("card", id))
    }

    /// A card that has not yet reached the end of its display period.
    fn live_card(&self, id: CardId) -> DomainResult<Card> {
        let card = self.load_card(id)?;
        if card.is_expired(self.now()) {
            return Err(DomainError::state(format!("card {id} has expired")));
        }
        Ok(card)
    }
}
