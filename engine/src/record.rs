//! Record types for storing data.

use crate::{error::Result, Error, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A user record.
///
/// The payload is opaque to the engine. Records are replaced whole, never
/// patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Globally unique, stable identifier
    pub id: RecordId,
    /// The actual data payload (JSON value)
    pub payload: serde_json::Value,
}

impl Record {
    /// Create a record with a caller-supplied id.
    pub fn new(id: impl Into<RecordId>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// Create a record with a freshly generated UUID v4 id.
    pub fn generate(payload: serde_json::Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), payload)
    }
}

/// An ordered set of records, unique by id.
///
/// Serializes as a plain JSON array. When deserializing, a repeated id
/// replaces the earlier payload but keeps the earlier position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Record>", into = "Vec<Record>")]
pub struct RecordCollection {
    records: Vec<Record>,
    index: HashMap<RecordId, usize>,
}

impl RecordCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the collection has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Record ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.records.iter().map(|r| &r.id)
    }

    /// Records as a slice, in order.
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Append a new record. Fails if the id is already present.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        if self.contains(&record.id) {
            return Err(Error::DuplicateRecord(record.id));
        }
        self.push_unchecked(record);
        Ok(())
    }

    /// Replace an existing record wholesale. Fails if the id is unknown.
    pub fn replace(&mut self, record: Record) -> Result<Record> {
        match self.index.get(&record.id) {
            Some(&pos) => Ok(std::mem::replace(&mut self.records[pos], record)),
            None => Err(Error::RecordNotFound(record.id)),
        }
    }

    /// Replace in place if the id exists, otherwise append.
    pub fn upsert(&mut self, record: Record) {
        match self.index.get(&record.id) {
            Some(&pos) => self.records[pos] = record,
            None => self.push_unchecked(record),
        }
    }

    /// Remove a record by id, preserving the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<Record> {
        let pos = self.index.remove(id)?;
        let removed = self.records.remove(pos);
        self.reindex_from(pos);
        Some(removed)
    }

    /// Keep only the records matching the predicate.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Record) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|r| keep(r));
        if self.records.len() != before {
            self.index.clear();
            self.reindex_from(0);
        }
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }

    /// Consume the collection, returning the records in order.
    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }

    fn push_unchecked(&mut self, record: Record) {
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, record) in self.records.iter().enumerate().skip(start) {
            self.index.insert(record.id.clone(), pos);
        }
    }
}

impl From<Vec<Record>> for RecordCollection {
    fn from(records: Vec<Record>) -> Self {
        records.into_iter().collect()
    }
}

impl From<RecordCollection> for Vec<Record> {
    fn from(collection: RecordCollection) -> Self {
        collection.records
    }
}

impl FromIterator<Record> for RecordCollection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut collection = RecordCollection::new();
        for record in iter {
            collection.upsert(record);
        }
        collection
    }
}

impl IntoIterator for RecordCollection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(id: &str, name: &str) -> Record {
        Record::new(id, json!({"name": name}))
    }

    #[test]
    fn create_record() {
        let record = card("card-1", "Alice");
        assert_eq!(record.id, "card-1");
        assert_eq!(record.payload, json!({"name": "Alice"}));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Record::generate(json!({}));
        let b = Record::generate(json!({}));
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut collection = RecordCollection::new();
        collection.insert(card("a", "Alice")).unwrap();

        let result = collection.insert(card("a", "Bob"));
        assert!(matches!(result, Err(Error::DuplicateRecord(id)) if id == "a"));
        assert_eq!(collection.get("a").unwrap().payload, json!({"name": "Alice"}));
    }

    #[test]
    fn replace_keeps_position() {
        let mut collection: RecordCollection =
            vec![card("a", "Alice"), card("b", "Bob"), card("c", "Carol")].into();

        let old = collection.replace(card("b", "Bobby")).unwrap();
        assert_eq!(old.payload, json!({"name": "Bob"}));

        let ids: Vec<_> = collection.ids().cloned().collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(collection.get("b").unwrap().payload, json!({"name": "Bobby"}));
    }

    #[test]
    fn replace_unknown_id() {
        let mut collection = RecordCollection::new();
        let result = collection.replace(card("ghost", "Nobody"));
        assert!(matches!(result, Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn remove_reindexes() {
        let mut collection: RecordCollection =
            vec![card("a", "Alice"), card("b", "Bob"), card("c", "Carol")].into();

        let removed = collection.remove("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(collection.remove("a").is_none());

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get("c").unwrap().id, "c");
        assert_eq!(collection.as_slice()[0].id, "b");
    }

    #[test]
    fn retain_reindexes() {
        let mut collection: RecordCollection =
            vec![card("a", "Alice"), card("b", "Bob"), card("c", "Carol")].into();

        collection.retain(|r| r.id != "b");
        assert_eq!(collection.len(), 2);
        assert!(!collection.contains("b"));
        assert_eq!(collection.get("c").unwrap().payload, json!({"name": "Carol"}));
    }

    #[test]
    fn serializes_as_array() {
        let collection: RecordCollection = vec![card("a", "Alice"), card("b", "Bob")].into();
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            json,
            json!([
                {"id": "a", "payload": {"name": "Alice"}},
                {"id": "b", "payload": {"name": "Bob"}}
            ])
        );
    }

    #[test]
    fn deserialize_collapses_repeated_ids() {
        let json = r#"[
            {"id": "a", "payload": 1},
            {"id": "b", "payload": 2},
            {"id": "a", "payload": 3}
        ]"#;
        let collection: RecordCollection = serde_json::from_str(json).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.as_slice()[0].payload, json!(3));
        assert_eq!(collection.as_slice()[1].id, "b");
    }
}
