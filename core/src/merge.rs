//! Reconciliation of keyed items inside a parent list that is fetched, edited
//! and written back whole (CloudFront cache behaviors, origins, ...).
//!
//! Keys are assumed to be unique within a list; nothing here enforces it.

pub trait Keyed {
    fn key(&self) -> &str;
}

/// Appends every item of `new` to `items`.
pub fn add_items<T: Keyed>(items: &mut Vec<T>, new: impl IntoIterator<Item = T>) {
    items.extend(new);
}

/// Replaces each existing item that shares a key with an item of `new`, keeping
/// its position. Items of `new` with no existing counterpart are appended.
pub fn update_items<T: Keyed>(items: &mut Vec<T>, new: impl IntoIterator<Item = T>) {
    for item in new {
        match items.iter().position(|existing| existing.key() == item.key()) {
            Some(i) => items[i] = item,
            None => items.push(item),
        }
    }
}

/// Drops every item whose key is listed in `keys`. Returns how many were removed.
pub fn remove_items<T: Keyed, K: AsRef<str>>(items: &mut Vec<T>, keys: &[K]) -> usize {
    let before = items.len();
    items.retain(|item| !keys.iter().any(|k| k.as_ref() == item.key()));
    before - items.len()
}

/// Returns the items whose key is listed in `keys`, in the order of `keys`.
pub fn select_items<'a, T: Keyed, K: AsRef<str>>(items: &'a [T], keys: &[K]) -> Vec<&'a T> {
    keys.iter()
        .flat_map(|k| items.iter().filter(move |item| item.key() == k.as_ref()))
        .collect()
}

pub fn quantity<T>(items: &[T]) -> anyhow::Result<i32> {
    Ok(i32::try_from(items.len())?)
}
