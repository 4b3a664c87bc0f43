//! # Catalog and History Maintenance
//!
//! Offline operations on a shop's record store. The shop itself never writes
//! the catalog; items are added here while no shop process holds the data
//! directory.

use pos_01_checkout::{
    decode_catalog, decode_history, encode_catalog, Cart, CartHistory, CartId, Catalog, Item,
    ItemId, RecordStore, ShopError, CATALOG_COLLECTION, HISTORY_COLLECTION,
};
use shared_types::Amount;
use thiserror::Error;

/// Errors from admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error("Item {0} already exists")]
    DuplicateItem(ItemId),

    #[error("Item name must not be empty")]
    EmptyName,
}

pub fn load_catalog(store: &impl RecordStore) -> Result<Catalog, ShopError> {
    let records = store.read_all(CATALOG_COLLECTION).map_err(ShopError::storage)?;
    decode_catalog(CATALOG_COLLECTION, records)
}

/// Append an item to the catalog. A random id is generated when `id` is `None`.
pub fn add_catalog_item(
    store: &impl RecordStore,
    id: Option<ItemId>,
    name: &str,
    price: Amount,
) -> Result<Item, AdminError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::EmptyName);
    }
    let mut catalog = load_catalog(store)?;
    let id = id.unwrap_or_else(|| ItemId::new(shared_crypto::random_id()));
    if catalog.get(&id).is_ok() {
        return Err(AdminError::DuplicateItem(id));
    }

    let item = catalog.seed(id, name, price).clone();
    let records = encode_catalog(CATALOG_COLLECTION, &catalog)?;
    store
        .write_all(CATALOG_COLLECTION, records)
        .map_err(ShopError::storage)?;

    tracing::info!("[pos-runtime] Added item {} ({}) at {}", item.id, item.name, item.price);
    Ok(item)
}

pub fn load_history(store: &impl RecordStore) -> Result<CartHistory, ShopError> {
    let records = store.read_all(HISTORY_COLLECTION).map_err(ShopError::storage)?;
    decode_history(HISTORY_COLLECTION, records)
}

/// Every cart, or only those still owing money.
pub fn list_history(store: &impl RecordStore, unsettled_only: bool) -> Result<Vec<Cart>, ShopError> {
    let history = load_history(store)?;
    Ok(if unsettled_only {
        history.unsettled().cloned().collect()
    } else {
        history.all().to_vec()
    })
}

pub fn show_cart(store: &impl RecordStore, cart_id: &CartId) -> Result<Cart, ShopError> {
    load_history(store)?.get(cart_id).cloned()
}
