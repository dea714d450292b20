use std::collections::HashMap;

use crate::config;
use crate::logical_plan::{LogicalPlan, Relation};
use crate::types::Schema;
use crate::{AnalysisError, Result};

/// The table side of the catalog. Registration happens before analysis;
/// analyzers only read, so sharing behind an `Arc` needs no locking.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<String, Relation>,
}

impl Catalog {
    pub fn new() -> Self {
        Self { tables: HashMap::new() }
    }

    pub fn register_table(&mut self, name: impl Into<String>, schema: &Schema) {
        let name = name.into();
        let relation = Relation::new(name.clone(), schema);
        self.tables.insert(config::fold_name(&name), relation);
    }

    /// Repeated lookups of one table share attribute ids; deduplication
    /// mints fresh instances where that matters.
    pub fn lookup_relation(&self, name: &str) -> Result<LogicalPlan> {
        self.tables
            .get(&config::fold_name(name))
            .map(|r| LogicalPlan::Relation(r.clone()))
            .ok_or_else(|| AnalysisError::TableNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field};

    #[test]
    fn test_lookup() {
        let mut catalog = Catalog::new();
        catalog.register_table("t", &Schema::new(vec![Field::new("a", DataType::Int32)]));
        assert!(catalog.lookup_relation("t").is_ok());
        assert_eq!(
            catalog.lookup_relation("missing"),
            Err(AnalysisError::TableNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_lookups_share_ids() {
        let mut catalog = Catalog::new();
        catalog.register_table("t", &Schema::new(vec![Field::new("a", DataType::Int32)]));
        let a = catalog.lookup_relation("t").unwrap().output();
        let b = catalog.lookup_relation("t").unwrap().output();
        assert_eq!(a[0].expr_id, b[0].expr_id);
    }
}
