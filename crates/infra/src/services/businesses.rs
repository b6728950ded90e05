use tradepost_auth::{Action, Actor, Resource, enforce};
use tradepost_core::{BusinessId, DomainResult, ExpectedVersion, UserId};
use tradepost_marketplace::{Address, AdminChange, Business, BusinessType, MarketEvent, User};

use super::missing;
use crate::Marketplace;
use crate::store::{Change, ChangeSet};

impl Marketplace {
    /// Register a business with the actor as its primary administrator.
    pub fn register_business(
        &self,
        actor: &Actor,
        name: &str,
        business_type: BusinessType,
        address: Address,
    ) -> DomainResult<Business> {
        let business = Business::new(name, business_type, address, actor.id, self.now())?;
        self.with_conflict_retry("register_business", || {
            let mut owner = self.load_user(actor.id)?;
            let expected = ExpectedVersion::Exact(owner.version);
            owner.businesses_administered.insert(business.id);
            self.store.commit(
                ChangeSet::new()
                    .with(Change::PutBusiness {
                        business: business.clone(),
                        expected: ExpectedVersion::Exact(0),
                    })
                    .with(Change::PutUser { user: owner, expected }),
            )
        })?;
        tracing::info!(business_id = %business.id, owner = %actor.id, "business registered");
        self.load_business(business.id)
    }

    pub fn business(&self, id: BusinessId) -> DomainResult<Business> {
        self.load_business(id)
    }

    /// Primary administrator or a global admin.
    pub fn add_administrator(
        &self,
        actor: &Actor,
        business_id: BusinessId,
        user_id: UserId,
    ) -> DomainResult<Business> {
        let business = self.with_conflict_retry("add_administrator", || {
            let mut business = self.load_business(business_id)?;
            enforce(actor, Action::ManageAdministrators, Resource::Business(&business))?;
            let mut user = self.load_user(user_id)?;

            let business_version = business.version;
            business.add_administrator(user_id)?;
            user.businesses_administered.insert(business_id);
            self.commit_membership(business, business_version, user)
        })?;

        tracing::info!(%business_id, %user_id, actor = %actor.id, "administrator added");
        self.notify_admin_change(user_id, AdminChange::BusinessAdministratorAdded {
            business_id,
            business_name: business.name.clone(),
        });
        Ok(business)
    }

    /// Refused with a state error for the primary administrator, and for the
    /// DGAA revoking itself.
    pub fn remove_administrator(
        &self,
        actor: &Actor,
        business_id: BusinessId,
        user_id: UserId,
    ) -> DomainResult<Business> {
        let business = self.with_conflict_retry("remove_administrator", || {
            let mut business = self.load_business(business_id)?;
            enforce(
                actor,
                Action::RevokeAdministrator { target: user_id },
                Resource::Business(&business),
            )?;
            let mut user = self.load_user(user_id)?;

            let business_version = business.version;
            business.remove_administrator(user_id)?;
            user.businesses_administered.remove(&business_id);
            self.commit_membership(business, business_version, user)
        })?;

        tracing::info!(%business_id, %user_id, actor = %actor.id, "administrator removed");
        self.notify_admin_change(user_id, AdminChange::BusinessAdministratorRemoved {
            business_id,
            business_name: business.name.clone(),
        });
        Ok(business)
    }

    /// Make an existing administrator the primary administrator.
    pub fn transfer_primary_administrator(
        &self,
        actor: &Actor,
        business_id: BusinessId,
        user_id: UserId,
    ) -> DomainResult<Business> {
        let business = self.with_conflict_retry("transfer_primary_administrator", || {
            let mut business = self.load_business(business_id)?;
            enforce(actor, Action::ManageAdministrators, Resource::Business(&business))?;
            let expected = ExpectedVersion::Exact(business.version);
            business.transfer_primary_administrator(user_id)?;
            self.store.commit(ChangeSet::new().with(Change::PutBusiness {
                business: business.clone(),
                expected,
            }))?;
            self.load_business(business_id)
        })?;

        tracing::info!(%business_id, %user_id, actor = %actor.id, "primary administrator transferred");
        self.notify_admin_change(user_id, AdminChange::PrimaryAdministratorTransferred {
            business_id,
            business_name: business.name.clone(),
        });
        Ok(business)
    }

    pub(crate) fn load_business(&self, id: BusinessId) -> DomainResult<Business> {
        self.store.business(id)?.ok_or_else(|| missing("business", id))
    }

    fn commit_membership(
        &self,
        business: Business,
        business_version: u64,
        user: User,
    ) -> DomainResult<Business> {
        let id = business.id;
        let user_version = user.version;
        self.store.commit(
            ChangeSet::new()
                .with(Change::PutBusiness {
                    business,
                    expected: ExpectedVersion::Exact(business_version),
                })
                .with(Change::PutUser {
                    user,
                    expected: ExpectedVersion::Exact(user_version),
                }),
        )?;
        self.load_business(id)
    }

    fn notify_admin_change(&self, user_id: UserId, change: AdminChange) {
        self.publish(MarketEvent::AdminStatusChanged {
            user_id,
            change,
            occurred_at: self.now(),
        });
    }
}
