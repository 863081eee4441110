use std::collections::BTreeMap;

use super::index::Index;
use super::sequence::Sequence;
use super::table::Table;
use super::view::View;

/// A namespace of tables, views and sequences.
///
/// Index names share one namespace per schema across all of its tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub(super) name: String,
    pub(super) tables: BTreeMap<String, Table>,
    pub(super) views: BTreeMap<String, View>,
    pub(super) sequences: BTreeMap<String, Sequence>,
    pub(super) frozen: bool,
}

impl Schema {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: BTreeMap::new(),
            views: BTreeMap::new(),
            sequences: BTreeMap::new(),
            frozen: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.values()
    }

    pub fn sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences.get(name)
    }

    /// Every index in the schema, ordered by table then index name.
    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.tables.values().flat_map(|t| t.indexes())
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes().find(|i| i.name == name)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(super) fn freeze(&mut self) {
        self.frozen = true;
        for t in self.tables.values_mut() {
            t.frozen = true;
        }
    }

    /// Whether any table, view or sequence already uses `name`. Relations
    /// and sequences share a namespace on every provider.
    pub(super) fn has_object(&self, name: &str) -> bool {
        self.tables.contains_key(name)
            || self.views.contains_key(name)
            || self.sequences.contains_key(name)
    }
}
