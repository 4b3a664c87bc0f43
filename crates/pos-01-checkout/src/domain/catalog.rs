//! # Catalog
//!
//! Read-only item lookup. Catalog maintenance happens outside the shop
//! (the runtime's admin CLI writes the collection directly).

use super::entities::Item;
use super::errors::ShopError;
use super::value_objects::ItemId;
use serde_json::Value;

/// Ordered item catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Look up an item by id.
    pub fn get(&self, item_id: &ItemId) -> Result<&Item, ShopError> {
        self.items
            .iter()
            .find(|item| &item.id == item_id)
            .ok_or_else(|| ShopError::ItemNotFound {
                item_id: item_id.clone(),
            })
    }

    pub fn all(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item to the catalog, returning it.
    pub fn seed(&mut self, id: ItemId, name: impl Into<String>, price: u64) -> &Item {
        self.items.push(Item {
            id,
            name: name.into(),
            price,
        });
        &self.items[self.items.len() - 1]
    }
}

/// Decode the catalog collection.
///
/// Rejects records with missing or unknown fields and duplicate ids.
pub fn decode_catalog(collection: &str, records: Vec<Value>) -> Result<Catalog, ShopError> {
    let mut items: Vec<Item> = Vec::with_capacity(records.len());
    for record in records {
        let item: Item =
            serde_json::from_value(record).map_err(|e| ShopError::decode(collection, e))?;
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(ShopError::decode(
                collection,
                format!("duplicate item id {}", item.id),
            ));
        }
        items.push(item);
    }
    Ok(Catalog::new(items))
}

/// Encode the catalog for a full overwrite of its collection.
pub fn encode_catalog(collection: &str, catalog: &Catalog) -> Result<Vec<Value>, ShopError> {
    catalog
        .all()
        .iter()
        .map(|item| serde_json::to_value(item).map_err(|e| ShopError::decode(collection, e)))
        .collect()
}
