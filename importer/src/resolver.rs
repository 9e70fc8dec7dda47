use serde_json::Value;
use std::collections::{HashMap, HashSet};
use vocab_data::{palette_color, CategoryId, WordRecord};

use crate::{store::Store, store::StoreError, Item, ItemError, ItemErrorKind};

/// Category name to storage id.
pub type CategoryMap = HashMap<String, CategoryId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCategory {
    pub id: CategoryId,
    pub name: String,
    pub color: &'static str,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub categories: CategoryMap,
    /// New categories, in creation order.
    pub created: Vec<CreatedCategory>,
    pub errors: Vec<ItemError>,
}

/// Distinct category names referenced by the entries, in order of first appearance.
pub fn required_categories(records: &[Value]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(WordRecord::category_of)
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Make sure every category the entries name exists, creating the missing ones.
///
/// Only failing to list the existing categories is an error; a category that cannot be created
/// is reported in the resolution and left out of its map.
pub fn resolve<S: Store + ?Sized>(
    store: &mut S,
    records: &[Value],
) -> Result<Resolution, StoreError> {
    let mut categories: CategoryMap = store
        .categories()?
        .into_iter()
        .map(|c| (c.name, c.id))
        .collect();
    tracing::info!("found {} existing categories", categories.len());

    let missing: Vec<&str> = required_categories(records)
        .into_iter()
        .filter(|name| !categories.contains_key(*name))
        .collect();
    tracing::info!("{} new categories to create", missing.len());

    let mut created = Vec::new();
    let mut errors = Vec::new();
    for name in missing {
        // Failed creations do not use up a colour.
        let color = palette_color(created.len());
        match store.add_category(name, color) {
            Ok(id) => {
                tracing::info!("created category {name:?} ({color})");
                categories.insert(name.to_owned(), id);
                created.push(CreatedCategory {
                    id,
                    name: name.to_owned(),
                    color,
                });
            }
            Err(e) => {
                tracing::warn!("could not create category {name:?}: {e}");
                errors.push(ItemError {
                    item: Item::Category(name.to_owned()),
                    kind: ItemErrorKind::CreateCategory(e),
                });
            }
        }
    }

    Ok(Resolution {
        categories,
        created,
        errors,
    })
}
