//! Record stores
//!
//! A `RecordStore` is a typed, path-scoped handle into one record: a pointer,
//! the user the access is attributed to, and a path narrowing the view onto a
//! part of the record's value tree. Stores are cheap to clone and never hold
//! data of their own: every read resolves through the shared cache, so a
//! write through any store on a pointer is immediately visible to all of its
//! siblings.
//!
//! Stores never mutate state. Mutation happens in the transaction layer,
//! which writes back through [`StoreContext::update_cache`].

use crate::context::StoreContext;
use folio_core::{PathSegment, Pointer, Record, RecordPath, Result, Role, Value};
use std::sync::Arc;

/// Path-scoped, user-attributed handle for reading a record through the
/// shared cache
#[derive(Clone)]
pub struct RecordStore {
    pointer: Pointer,
    user_id: String,
    path: RecordPath,
    context: StoreContext,
}

impl RecordStore {
    /// Create a store rooted at the whole record
    pub fn new(context: StoreContext, user_id: impl Into<String>, pointer: Pointer) -> Self {
        RecordStore {
            pointer,
            user_id: user_id.into(),
            path: RecordPath::root(),
            context,
        }
    }

    /// The record this store points at
    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// The user this store's access is attributed to
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The path this store is scoped to
    pub fn path(&self) -> &RecordPath {
        &self.path
    }

    /// The store context this store resolves through
    pub fn context(&self) -> &StoreContext {
        &self.context
    }

    /// The store for the same pointer rooted at path `[]`
    ///
    /// Used to read or update the whole record (including its role) when an
    /// operation is applied.
    pub fn at_root_path(&self) -> RecordStore {
        RecordStore {
            pointer: self.pointer.clone(),
            user_id: self.user_id.clone(),
            path: RecordPath::root(),
            context: self.context.clone(),
        }
    }

    /// A sub-store narrowed onto one property of this store's value
    pub fn property_store(&self, key: impl Into<String>) -> RecordStore {
        self.child_store(RecordPath::root().key(key))
    }

    /// A sub-store narrowed onto a relative path below this store
    ///
    /// The child shares the same cache entry; only the path differs.
    pub fn child_store(&self, relative: RecordPath) -> RecordStore {
        RecordStore {
            pointer: self.pointer.clone(),
            user_id: self.user_id.clone(),
            path: self.path.join(&relative),
            context: self.context.clone(),
        }
    }

    /// The whole backing record, if it exists in cache or storage
    pub fn get_record(&self) -> Result<Option<Arc<Record>>> {
        self.context.read_through(&self.user_id, &self.pointer)
    }

    /// The whole backing record, materializing the default on first touch
    ///
    /// Records come into being on the first read through a cache miss; the
    /// default is an empty map under an `Editor` role.
    pub fn get_or_default_record(&self) -> Result<Arc<Record>> {
        match self.get_record()? {
            Some(record) => Ok(record),
            None => Ok(Arc::new(Record::default())),
        }
    }

    /// The current value at this store's path, resolved through the cache
    pub fn get_value(&self) -> Option<Value> {
        let record = self
            .context
            .read_through(&self.user_id, &self.pointer)
            .ok()??;
        resolve_path(&record.value, &self.path).cloned()
    }

    /// The record's current role
    pub fn get_role(&self) -> Role {
        self.context
            .read_through(&self.user_id, &self.pointer)
            .ok()
            .flatten()
            .map(|record| record.role)
            .unwrap_or(Role::None)
    }

    /// Capability check derived from the role
    ///
    /// Not enforced here; enforcement happens when operations are applied.
    pub fn can_edit(&self) -> bool {
        self.get_role().can_edit()
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("pointer", &self.pointer)
            .field("user_id", &self.user_id)
            .field("path", &self.path.to_string())
            .finish()
    }
}

/// Resolve a path against a value tree, returning None where it fails to
/// resolve
fn resolve_path<'a>(value: &'a Value, path: &RecordPath) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Map(entries)) => entries.get(key)?,
            (PathSegment::Index(idx), Value::List(items)) => items.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecordCache;
    use crate::provider::MemoryStorageProvider;
    use folio_core::Table;
    use std::collections::BTreeMap;

    fn context() -> StoreContext {
        StoreContext::new(
            Arc::new(RecordCache::new()),
            Arc::new(MemoryStorageProvider::new()),
        )
    }

    fn page_record() -> Record {
        let mut properties = BTreeMap::new();
        properties.insert("title".to_string(), Value::from("Hello"));
        let mut root = BTreeMap::new();
        root.insert("properties".to_string(), Value::Map(properties));
        root.insert(
            "content".to_string(),
            Value::List(vec![Value::from("b-1"), Value::from("b-2")]),
        );
        Record::new(Value::Map(root), Role::Editor)
    }

    #[test]
    fn test_get_value_at_path() {
        let context = context();
        let pointer = Pointer::new(Table::Page, "p-1");
        context.update_cache("u-1", &pointer, page_record(), false);

        let store = RecordStore::new(context, "u-1", pointer);
        let title = store.child_store("properties.title".parse().unwrap());
        assert_eq!(title.get_value(), Some(Value::from("Hello")));

        let second_block = store.child_store("content[1]".parse().unwrap());
        assert_eq!(second_block.get_value(), Some(Value::from("b-2")));
    }

    #[test]
    fn test_unresolvable_path_is_none() {
        let context = context();
        let pointer = Pointer::new(Table::Page, "p-1");
        context.update_cache("u-1", &pointer, page_record(), false);

        let store = RecordStore::new(context, "u-1", pointer);
        assert!(store.property_store("missing").get_value().is_none());
        assert!(store
            .child_store("content[9]".parse().unwrap())
            .get_value()
            .is_none());
    }

    #[test]
    fn test_sibling_stores_share_cache_entry() {
        let context = context();
        let pointer = Pointer::new(Table::Page, "p-1");
        let store = RecordStore::new(context.clone(), "u-1", pointer.clone());
        let title = store.property_store("title");
        let sibling = store.property_store("title");

        let mut root = BTreeMap::new();
        root.insert("title".to_string(), Value::from("World"));
        context.update_cache("u-1", &pointer, Record::new(Value::Map(root), Role::Editor), false);

        // Both sub-stores observe the write immediately.
        assert_eq!(title.get_value(), Some(Value::from("World")));
        assert_eq!(sibling.get_value(), Some(Value::from("World")));
    }

    #[test]
    fn test_root_path_store() {
        let context = context();
        let pointer = Pointer::new(Table::Page, "p-1");
        context.update_cache("u-1", &pointer, page_record(), false);

        let nested = RecordStore::new(context, "u-1", pointer)
            .child_store("properties.title".parse().unwrap());
        let root = nested.at_root_path();
        assert!(root.path().is_root());
        assert!(root.get_value().unwrap().is_map());
    }

    #[test]
    fn test_role_and_capability() {
        let context = context();
        let pointer = Pointer::new(Table::Page, "p-1");
        let store = RecordStore::new(context.clone(), "u-1", pointer.clone());

        // Unmaterialized record carries no capability.
        assert_eq!(store.get_role(), Role::None);
        assert!(!store.can_edit());

        context.update_cache("u-1", &pointer, page_record(), false);
        assert_eq!(store.get_role(), Role::Editor);
        assert!(store.can_edit());
    }

    #[test]
    fn test_default_record_on_first_touch() {
        let context = context();
        let store = RecordStore::new(context, "u-1", Pointer::new(Table::Block, "b-9"));
        let record = store.get_or_default_record().unwrap();
        assert!(record.can_edit());
        assert_eq!(record.value, Value::map());
    }
}
