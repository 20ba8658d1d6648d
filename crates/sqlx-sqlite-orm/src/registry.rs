//! Process-wide registry of entity mappings, keyed by type name

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::warn;

use crate::mapping::Mapping;

static MAPPINGS: LazyLock<RwLock<HashMap<String, Arc<Mapping>>>> =
   LazyLock::new(|| RwLock::new(HashMap::new()));

/// Record a freshly built mapping; a redefinition replaces the previous entry
pub(crate) fn register(mapping: &Arc<Mapping>) {
   let previous = MAPPINGS
      .write()
      .insert(mapping.type_name().to_string(), Arc::clone(mapping));

   if previous.is_some() {
      warn!("Redefine class: {}", mapping.type_name());
   }
}

/// Most recent mapping built for `type_name`
pub fn lookup(type_name: &str) -> Option<Arc<Mapping>> {
   MAPPINGS.read().get(type_name).cloned()
}

/// Names of all registered entity types, sorted
pub fn registered() -> Vec<String> {
   let mut names: Vec<_> = MAPPINGS.read().keys().cloned().collect();
   names.sort();
   names
}
