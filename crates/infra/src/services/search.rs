use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_auth::{Action, Actor, Resource, enforce};
use tradepost_core::{BusinessId, DomainResult, KeywordId};
use tradepost_marketplace::{Business, BusinessType, Card, Keyword, Sale, SaleListing, Section, User};
use tradepost_search::{EntityKind, FilterSpec, MatchMode, Membership, Page, SortSpec, Value, compile};

use crate::Marketplace;
use crate::store::SearchHit;

/// Which listing attributes a free-text query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingField {
    ProductName,
    BusinessName,
    /// Country or city of the seller.
    Location,
    BusinessType,
}

impl ListingField {
    fn paths(self) -> &'static [&'static str] {
        match self {
            ListingField::ProductName => &["product.name"],
            ListingField::BusinessName => &["business.name"],
            ListingField::Location => &["business.address.country", "business.address.city"],
            ListingField::BusinessType => &["business.business_type"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    #[default]
    PriceAsc,
    PriceDesc,
    ProductName,
    Country,
    City,
    ExpiryDateAsc,
    ExpiryDateDesc,
    Seller,
}

impl ListingSort {
    pub fn spec(self) -> SortSpec {
        match self {
            ListingSort::PriceAsc => SortSpec::ascending("price"),
            ListingSort::PriceDesc => SortSpec::descending("price"),
            ListingSort::ProductName => SortSpec::ascending("product.name"),
            ListingSort::Country => SortSpec::ascending("business.address.country"),
            ListingSort::City => SortSpec::ascending("business.address.city"),
            ListingSort::ExpiryDateAsc => SortSpec::ascending("inventory_item.expires"),
            ListingSort::ExpiryDateDesc => SortSpec::descending("inventory_item.expires"),
            ListingSort::Seller => SortSpec::ascending("business.name"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingSearch {
    pub query: Option<String>,
    /// Defaults to the product name when empty.
    pub fields: Vec<ListingField>,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub closes_after: Option<DateTime<Utc>>,
    pub closes_before: Option<DateTime<Utc>>,
    pub sort: ListingSort,
    pub page: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessSearch {
    pub query: Option<String>,
    pub business_type: Option<BusinessType>,
    pub country: Option<String>,
    pub page: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardSearch {
    pub section: Option<Section>,
    pub keywords: Vec<KeywordId>,
    /// Every keyword (intersection) instead of any of them (union).
    pub match_all: bool,
    pub page: usize,
}

fn rows<T>(page: Page<SearchHit>, pick: impl Fn(SearchHit) -> Option<T>) -> Page<T> {
    Page {
        items: page.items.into_iter().filter_map(pick).collect(),
        page: page.page,
        size: page.size,
        total: page.total,
    }
}

impl Marketplace {
    /// Run a filter spec. Cards past their display period and closed listings
    /// are never returned, even before the sweep has removed them.
    pub fn search(&self, kind: EntityKind, spec: &FilterSpec) -> DomainResult<Page<SearchHit>> {
        let spec = match kind {
            EntityKind::Card => spec.clone().after("display_period_end", self.now()),
            EntityKind::SaleListing => spec.clone().after("closes", self.now()),
            _ => spec.clone(),
        };
        let query = compile(kind, &spec)?;
        tracing::debug!(%kind, page = query.page.page, "search");
        self.store.search(&query)
    }

    /// Users whose first, middle, last name or nickname matches `query`.
    pub fn search_users(&self, query: &str, page: usize) -> DomainResult<Page<User>> {
        let spec = FilterSpec::new()
            .query(query, ["first_name", "middle_name", "last_name", "nickname"])
            .sort_by(SortSpec::ascending("last_name"))
            .page(page, self.config.page_size);
        Ok(rows(self.search(EntityKind::User, &spec)?, |hit| match hit {
            SearchHit::User(user) => Some(user),
            _ => None,
        }))
    }

    pub fn search_businesses(&self, request: &BusinessSearch) -> DomainResult<Page<Business>> {
        let mut spec = FilterSpec::new()
            .sort_by(SortSpec::ascending("name"))
            .page(request.page, self.config.page_size);
        if let Some(query) = &request.query {
            spec = spec.query(query.clone(), ["name"]);
        }
        if let Some(business_type) = request.business_type {
            spec = spec.equals("business_type", business_type.label());
        }
        if let Some(country) = &request.country {
            spec = spec.filter("country", "address.country", MatchMode::Exact, country.clone());
        }
        Ok(rows(self.search(EntityKind::Business, &spec)?, |hit| match hit {
            SearchHit::Business(business) => Some(business),
            _ => None,
        }))
    }

    pub fn search_listings(&self, request: &ListingSearch) -> DomainResult<Page<SaleListing>> {
        let mut spec = FilterSpec::new()
            .sort_by(request.sort.spec())
            .page(request.page, self.config.page_size);
        if let Some(query) = &request.query {
            let fields: Vec<&str> = if request.fields.is_empty() {
                ListingField::ProductName.paths().to_vec()
            } else {
                request.fields.iter().flat_map(|f| f.paths().iter().copied()).collect()
            };
            spec = spec.query(query.clone(), fields);
        }
        if request.price_min.is_some() || request.price_max.is_some() {
            spec = spec.range(
                "price",
                request.price_min.map(Value::from),
                request.price_max.map(Value::from),
            );
        }
        if request.closes_after.is_some() || request.closes_before.is_some() {
            spec = spec.range(
                "closes",
                request.closes_after.map(Value::from),
                request.closes_before.map(Value::from),
            );
        }
        Ok(rows(self.search(EntityKind::SaleListing, &spec)?, |hit| match hit {
            SearchHit::SaleListing(listing) => Some(listing),
            _ => None,
        }))
    }

    /// Active cards, newest first.
    pub fn search_cards(&self, request: &CardSearch) -> DomainResult<Page<Card>> {
        let mut spec = FilterSpec::new()
            .sort_by(SortSpec::descending("created"))
            .page(request.page, self.config.page_size);
        if let Some(section) = request.section {
            spec = spec.equals("section", section.label());
        }
        if !request.keywords.is_empty() {
            let mode = if request.match_all { Membership::All } else { Membership::Any };
            let ids = request.keywords.iter().map(|k| Value::from(k.as_uuid()));
            spec = spec.members("keywords", ids, mode);
        }
        Ok(rows(self.search(EntityKind::Card, &spec)?, |hit| match hit {
            SearchHit::Card(card) => Some(card),
            _ => None,
        }))
    }

    pub fn search_keywords(&self, partial_name: &str, page: usize) -> DomainResult<Page<Keyword>> {
        let spec = FilterSpec::new()
            .filter("name", "name", MatchMode::Contains, partial_name)
            .sort_by(SortSpec::ascending("name"))
            .page(page, self.config.page_size);
        Ok(rows(self.search(EntityKind::Keyword, &spec)?, |hit| match hit {
            SearchHit::Keyword(keyword) => Some(keyword),
            _ => None,
        }))
    }

    /// Sales history of a business, most recent first. Administrators only.
    pub fn search_sales(
        &self,
        actor: &Actor,
        business_id: BusinessId,
        sold_from: Option<DateTime<Utc>>,
        sold_to: Option<DateTime<Utc>>,
        page: usize,
    ) -> DomainResult<Page<Sale>> {
        let business = self.load_business(business_id)?;
        enforce(actor, Action::View, Resource::Business(&business))?;

        let mut spec = FilterSpec::new()
            .equals("business.id", business_id.as_uuid())
            .sort_by(SortSpec::descending("date_sold"))
            .page(page, self.config.page_size);
        if sold_from.is_some() || sold_to.is_some() {
            spec = spec.range("date_sold", sold_from.map(Value::from), sold_to.map(Value::from));
        }
        Ok(rows(self.search(EntityKind::Sale, &spec)?, |hit| match hit {
            SearchHit::Sale(sale) => Some(sale),
            _ => None,
        }))
    }
}
