//! The shared store handed to every stage of a run.
//!
//! One `Store` exists per run. Stages receive `&mut Store`, so writes are
//! visible to every later stage and line in program order.

use rhai::{Dynamic, Map};

/// Value currency passed between stages: strings, numbers, booleans,
/// unit, maps and arrays.
pub type Value = Dynamic;

/// Mutable string-keyed context shared by begin, per-line and end stages.
#[derive(Debug, Clone, Default)]
pub struct Store {
    entries: Map,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Insert or overwrite `key`; last writer wins.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move the contents out as a script map, leaving the store empty
    /// until [`Store::restore`] is called.
    pub fn take(&mut self) -> Value {
        Dynamic::from_map(std::mem::take(&mut self.entries))
    }

    /// Put back contents previously moved out with [`Store::take`].
    ///
    /// Fails if a stage replaced the store with something other than a map;
    /// the store is left empty in that case.
    pub fn restore(&mut self, value: Value) -> Result<(), String> {
        let type_name = value.type_name();
        match value.try_cast::<Map>() {
            Some(entries) => {
                self.entries = entries;
                Ok(())
            }
            None => Err(format!("store must remain a map, got {type_name}")),
        }
    }

    fn to_value(&self) -> Value {
        Dynamic::from_map(self.entries.clone())
    }

    /// Compact JSON snapshot, compared by value between invocations.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.to_value())
            .unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }

    /// Indented JSON rendering for diagnostics.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_value())
            .unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}
