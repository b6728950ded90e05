//! Joined read views the predicate engine evaluates against.

use tradepost_marketplace::{Business, Card, InventoryItem, Keyword, Product, Sale, SaleListing, User};
use tradepost_search::{FieldPath, Searchable, Value};

fn opt(value: &Option<String>) -> Vec<Value> {
    value.iter().map(|v| Value::from(v.as_str())).collect()
}

fn one(value: impl Into<Value>) -> Vec<Value> {
    vec![value.into()]
}

/// A row searched on its own columns only.
#[derive(Debug, Clone)]
pub(crate) struct RowView<T>(pub T);

impl Searchable for RowView<User> {
    fn field_values(&self, path: &FieldPath) -> Vec<Value> {
        let u = &self.0;
        match path.as_str() {
            "id" => one(u.id.as_uuid()),
            "first_name" => one(u.first_name.as_str()),
            "middle_name" => opt(&u.middle_name),
            "last_name" => one(u.last_name.as_str()),
            "nickname" => opt(&u.nickname),
            "email" => one(u.email.as_str()),
            "role" => one(u.role.as_role().to_string()),
            "created" => one(u.created),
            _ => Vec::new(),
        }
    }

    fn sort_id(&self) -> Value {
        self.0.id.as_uuid().into()
    }
}

impl Searchable for RowView<Business> {
    fn field_values(&self, path: &FieldPath) -> Vec<Value> {
        let b = &self.0;
        match path.as_str() {
            "id" => one(b.id.as_uuid()),
            "name" => one(b.name.as_str()),
            "description" => opt(&b.description),
            "business_type" => one(b.business_type.label()),
            "address.city" => opt(&b.address.city),
            "address.region" => opt(&b.address.region),
            "address.country" => one(b.address.country.as_str()),
            "created" => one(b.created),
            "administrators" => b.administrators().iter().map(|a| a.as_uuid().into()).collect(),
            _ => Vec::new(),
        }
    }

    fn sort_id(&self) -> Value {
        self.0.id.as_uuid().into()
    }
}

impl Searchable for RowView<Product> {
    fn field_values(&self, path: &FieldPath) -> Vec<Value> {
        let p = &self.0;
        match path.as_str() {
            "id" => one(p.key.to_string()),
            "code" => one(p.key.code.as_str()),
            "name" => one(p.name.as_str()),
            "description" => opt(&p.description),
            "manufacturer" => opt(&p.manufacturer),
            "recommended_retail_price" => p.recommended_retail_price.into_iter().map(Value::from).collect(),
            "business.id" => one(p.key.business_id.as_uuid()),
            "created" => one(p.created),
            _ => Vec::new(),
        }
    }

    fn sort_id(&self) -> Value {
        self.0.key.to_string().into()
    }
}

impl Searchable for RowView<Keyword> {
    fn field_values(&self, path: &FieldPath) -> Vec<Value> {
        let k = &self.0;
        match path.as_str() {
            "id" => one(k.id.as_uuid()),
            "name" => one(k.name.as_str()),
            "created" => one(k.created),
            _ => Vec::new(),
        }
    }

    fn sort_id(&self) -> Value {
        self.0.id.as_uuid().into()
    }
}

impl Searchable for RowView<Sale> {
    fn field_values(&self, path: &FieldPath) -> Vec<Value> {
        let s = &self.0;
        match path.as_str() {
            "id" => one(s.id.as_uuid()),
            "business.id" => one(s.business_id.as_uuid()),
            "business.name" => one(s.business_name.as_str()),
            "product.code" => one(s.product.code.as_str()),
            "product.name" => one(s.product.name.as_str()),
            "price" => one(s.price),
            "quantity" => one(s.quantity),
            "closes" => one(s.closes),
            "date_sold" => one(s.date_sold),
            _ => Vec::new(),
        }
    }

    fn sort_id(&self) -> Value {
        self.0.id.as_uuid().into()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ItemView {
    pub item: InventoryItem,
    pub product: Option<Product>,
}

impl Searchable for ItemView {
    fn field_values(&self, path: &FieldPath) -> Vec<Value> {
        let i = &self.item;
        match path.as_str() {
            "id" => one(i.id.as_uuid()),
            "product.code" => one(i.product.code.as_str()),
            "product.name" => self.product.iter().map(|p| p.name.as_str().into()).collect(),
            "quantity" => one(i.quantity),
            "price_per_item" => i.price_per_item.into_iter().map(Value::from).collect(),
            "best_before" => i.best_before.into_iter().map(Value::from).collect(),
            "expires" => one(i.expires),
            "business.id" => one(i.business_id().as_uuid()),
            _ => Vec::new(),
        }
    }

    fn sort_id(&self) -> Value {
        self.item.id.as_uuid().into()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ListingView {
    pub listing: SaleListing,
    pub item: Option<InventoryItem>,
    pub product: Option<Product>,
    pub business: Option<Business>,
}

impl Searchable for ListingView {
    fn field_values(&self, path: &FieldPath) -> Vec<Value> {
        let l = &self.listing;
        let business = self.business.as_ref();
        match path.as_str() {
            "id" => one(l.id.as_uuid()),
            "price" => one(l.price),
            "quantity" => one(l.quantity),
            "more_info" => opt(&l.more_info),
            "created" => one(l.created),
            "closes" => one(l.closes),
            "product.code" => self.item.iter().map(|i| i.product.code.as_str().into()).collect(),
            "product.name" => self.product.iter().map(|p| p.name.as_str().into()).collect(),
            "inventory_item.expires" => self.item.iter().map(|i| i.expires.into()).collect(),
            "business.id" => one(l.business_id.as_uuid()),
            "business.name" => business.map(|b| b.name.as_str().into()).into_iter().collect(),
            "business.business_type" => business.map(|b| b.business_type.label().into()).into_iter().collect(),
            "business.address.city" => business.map(|b| opt(&b.address.city)).unwrap_or_default(),
            "business.address.country" => business
                .map(|b| b.address.country.as_str().into())
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    fn sort_id(&self) -> Value {
        self.listing.id.as_uuid().into()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CardView {
    pub card: Card,
    pub keyword_names: Vec<String>,
}

impl Searchable for CardView {
    fn field_values(&self, path: &FieldPath) -> Vec<Value> {
        let c = &self.card;
        match path.as_str() {
            "id" => one(c.id.as_uuid()),
            "creator.id" => one(c.creator.as_uuid()),
            "section" => one(c.section.label()),
            "title" => one(c.title.as_str()),
            "description" => opt(&c.description),
            "keywords" => c.keywords.iter().map(|k| k.as_uuid().into()).collect(),
            "keywords.name" => self.keyword_names.iter().map(|n| n.as_str().into()).collect(),
            "created" => one(c.created),
            "display_period_end" => one(c.display_period_end),
            _ => Vec::new(),
        }
    }

    fn sort_id(&self) -> Value {
        self.card.id.as_uuid().into()
    }
}
