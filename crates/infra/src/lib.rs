//! Infrastructure layer: persistence gateway, lifecycle sweep, scheduler,
//! configuration and the user-facing marketplace operations.

pub mod app;
pub mod config;
pub mod directory;
pub mod lifecycle;
pub mod provisioning;
pub mod publisher;
pub mod scheduler;
pub mod services;
pub mod store;

pub use app::Marketplace;
pub use config::{ConfigError, DefaultAdmin, MarketplaceConfig};
pub use directory::StoreDirectory;
pub use lifecycle::{LifecycleManager, SweepError, SweepSummary};
pub use provisioning::{SeedReport, ensure_default_admin, seed_demo_data};
pub use publisher::{MarketPublisher, PublishOutcome};
pub use scheduler::{SchedulerConfig, SchedulerHandle, SchedulerStats, SweepScheduler};
pub use services::{
    BusinessSearch, CardEdit, CardSearch, ListingField, ListingSearch, ListingSort, NewCard,
    NewListing,
};
pub use store::{Change, ChangeSet, InMemoryMarketStore, MarketStore, SearchHit};
