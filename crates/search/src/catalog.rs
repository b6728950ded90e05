//! Searchable fields per entity kind.

use serde::{Deserialize, Serialize};

use crate::ValueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Dotted path; segments before the last traverse relations.
    pub path: &'static str,
    pub kind: ValueKind,
    /// Multi-valued (e.g. a card's keywords).
    pub collection: bool,
}

const fn field(path: &'static str, kind: ValueKind) -> FieldDef {
    FieldDef { path, kind, collection: false }
}

const fn many(path: &'static str, kind: ValueKind) -> FieldDef {
    FieldDef { path, kind, collection: true }
}

use ValueKind::{Date, Id, Integer, Text, Timestamp};

const USER: &[FieldDef] = &[
    field("id", Id),
    field("first_name", Text),
    field("middle_name", Text),
    field("last_name", Text),
    field("nickname", Text),
    field("email", Text),
    field("role", Text),
    field("created", Timestamp),
];

const BUSINESS: &[FieldDef] = &[
    field("id", Id),
    field("name", Text),
    field("description", Text),
    field("business_type", Text),
    field("address.city", Text),
    field("address.region", Text),
    field("address.country", Text),
    field("created", Timestamp),
    many("administrators", Id),
];

const PRODUCT: &[FieldDef] = &[
    field("id", Text),
    field("code", Text),
    field("name", Text),
    field("description", Text),
    field("manufacturer", Text),
    field("recommended_retail_price", Integer),
    field("business.id", Id),
    field("created", Timestamp),
];

const INVENTORY_ITEM: &[FieldDef] = &[
    field("id", Id),
    field("product.code", Text),
    field("product.name", Text),
    field("quantity", Integer),
    field("price_per_item", Integer),
    field("best_before", Date),
    field("expires", Date),
    field("business.id", Id),
];

const SALE_LISTING: &[FieldDef] = &[
    field("id", Id),
    field("price", Integer),
    field("quantity", Integer),
    field("more_info", Text),
    field("created", Timestamp),
    field("closes", Timestamp),
    field("product.code", Text),
    field("product.name", Text),
    field("inventory_item.expires", Date),
    field("business.id", Id),
    field("business.name", Text),
    field("business.business_type", Text),
    field("business.address.city", Text),
    field("business.address.country", Text),
];

const CARD: &[FieldDef] = &[
    field("id", Id),
    field("creator.id", Id),
    field("section", Text),
    field("title", Text),
    field("description", Text),
    many("keywords", Id),
    many("keywords.name", Text),
    field("created", Timestamp),
    field("display_period_end", Timestamp),
];

const KEYWORD: &[FieldDef] = &[
    field("id", Id),
    field("name", Text),
    field("created", Timestamp),
];

const SALE: &[FieldDef] = &[
    field("id", Id),
    field("business.id", Id),
    field("business.name", Text),
    field("product.code", Text),
    field("product.name", Text),
    field("price", Integer),
    field("quantity", Integer),
    field("closes", Timestamp),
    field("date_sold", Timestamp),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Business,
    Product,
    InventoryItem,
    SaleListing,
    Card,
    Keyword,
    Sale,
}

impl EntityKind {
    pub fn fields(self) -> &'static [FieldDef] {
        match self {
            EntityKind::User => USER,
            EntityKind::Business => BUSINESS,
            EntityKind::Product => PRODUCT,
            EntityKind::InventoryItem => INVENTORY_ITEM,
            EntityKind::SaleListing => SALE_LISTING,
            EntityKind::Card => CARD,
            EntityKind::Keyword => KEYWORD,
            EntityKind::Sale => SALE,
        }
    }

    pub fn field(self, path: &str) -> Option<&'static FieldDef> {
        self.fields().iter().find(|f| f.path == path)
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Business => "business",
            EntityKind::Product => "product",
            EntityKind::InventoryItem => "inventory_item",
            EntityKind::SaleListing => "sale_listing",
            EntityKind::Card => "card",
            EntityKind::Keyword => "keyword",
            EntityKind::Sale => "sale",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
