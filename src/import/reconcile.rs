//! Import reconciliation
//!
//! Decides, per CSV row, whether to create a record or update an existing one, then
//! writes titles, properties and body text through the [`RecordStore`].
//!
//! Reconciliation runs in two phases:
//! 1. [`Reconciler::plan`] validates the mapping, indexes existing records by their
//!    deduplication key and collapses incoming rows so the last row per key wins.
//!    It performs no writes.
//! 2. [`Reconciler::apply`] creates or updates one record per planned row.
//!
//! A store failure aborts the run; rows applied before it stay applied.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::mapping::{ColumnMapping, ColumnRoles, DedupKeySelector};
use super::{ImportError, ImportResult, ParsedTable, cell};
use crate::storage::{RecordHandle, RecordStore, StorageError};
use crate::validation::mapping::validate_mapping;

/// Deduplication key of a row or an existing record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    /// Folded title or property text
    Value(String),
    /// Identity of a single row, used when deduplication is off
    Row(usize),
}

/// Normalize a key value: trim surrounding whitespace and ASCII-lowercase
///
/// Applied identically to existing records and incoming rows.
pub fn fold_key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// What will happen to a planned row
#[derive(Debug, Clone)]
pub enum PlannedAction<R> {
    Create,
    Update(R),
}

/// One row that survived collapsing
#[derive(Debug, Clone)]
pub struct PlannedRow<'t, R> {
    pub key: RowKey,
    /// Position of the row among the table's data rows
    pub row_index: usize,
    /// Trimmed, non-blank title
    pub title: String,
    pub row: &'t [String],
    pub action: PlannedAction<R>,
}

/// Outcome of the planning phase
#[derive(Debug)]
pub struct ImportPlan<'t, R> {
    pub roles: ColumnRoles,
    pub dedup_key: DedupKeySelector,
    /// Rows to apply, ordered by first appearance of their key
    pub rows: Vec<PlannedRow<'t, R>>,
    /// Rows rejected for a blank title
    pub skipped: usize,
    /// Rows superseded by a later row with the same key
    pub superseded: usize,
    existing: HashMap<RowKey, R>,
}

impl<R> ImportPlan<'_, R> {
    pub fn creates(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.action, PlannedAction::Create))
            .count()
    }

    pub fn updates(&self) -> usize {
        self.rows.len() - self.creates()
    }

    /// Counts the plan would produce if every creation succeeds
    pub fn preview(&self) -> ImportResult {
        ImportResult {
            created: self.creates(),
            updated: self.updates(),
            skipped: self.skipped,
        }
    }
}

/// Reconciles parsed rows against the records of one store
pub struct Reconciler<'s, S: RecordStore> {
    store: &'s S,
}

impl<'s, S: RecordStore> Reconciler<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Validate the mapping and work out the create/update decision for every row
    pub async fn plan<'t>(
        &self,
        table: &'t ParsedTable,
        mapping: &ColumnMapping,
        dedup_key: &DedupKeySelector,
    ) -> Result<ImportPlan<'t, S::Record>, ImportError> {
        validate_mapping(mapping)?;

        let fields = self.store.fields().await?;
        let roles = ColumnRoles::resolve(mapping, &fields)?;
        let existing = self.index_existing(dedup_key).await?;

        let mut rows: Vec<PlannedRow<'t, S::Record>> = Vec::new();
        let mut positions: HashMap<RowKey, usize> = HashMap::new();
        let mut skipped = 0;
        let mut superseded = 0;

        for (row_index, row) in table.rows.iter().enumerate() {
            let title = cell(row, roles.title_idx).trim();
            if title.is_empty() {
                debug!("Row {} has no title, skipping", row_index);
                skipped += 1;
                continue;
            }

            let key = row_key(dedup_key, &roles, row, row_index, title);
            let action = match existing.get(&key) {
                Some(record) if *dedup_key != DedupKeySelector::None => {
                    PlannedAction::Update(record.clone())
                }
                _ => PlannedAction::Create,
            };
            let planned = PlannedRow {
                key: key.clone(),
                row_index,
                title: title.to_string(),
                row: row.as_slice(),
                action,
            };

            match positions.get(&key) {
                Some(&pos) => {
                    debug!(
                        "Row {} supersedes row {} ({:?})",
                        row_index, rows[pos].row_index, key
                    );
                    superseded += 1;
                    rows[pos] = planned;
                }
                None => {
                    positions.insert(key, rows.len());
                    rows.push(planned);
                }
            }
        }

        info!(
            "Planned import of {} rows: {} unique keys, {} superseded, {} skipped",
            table.rows.len(),
            rows.len(),
            superseded,
            skipped
        );

        Ok(ImportPlan {
            roles,
            dedup_key: dedup_key.clone(),
            rows,
            skipped,
            superseded,
            existing,
        })
    }

    /// Create or update one record per planned row
    pub async fn apply(&self, plan: ImportPlan<'_, S::Record>) -> Result<ImportResult, ImportError> {
        let ImportPlan {
            roles,
            dedup_key,
            rows,
            skipped,
            mut existing,
            ..
        } = plan;
        let dedup_enabled = dedup_key != DedupKeySelector::None;

        let mut result = ImportResult {
            skipped,
            ..ImportResult::default()
        };

        for planned in rows {
            let (record, is_new) = match planned.action {
                PlannedAction::Update(record) => (record, false),
                PlannedAction::Create => {
                    // A record created earlier in this run under the same key is updated instead.
                    let created_earlier = if dedup_enabled {
                        existing.get(&planned.key).cloned()
                    } else {
                        None
                    };

                    match created_earlier {
                        Some(record) => (record, false),
                        None => match self.create_record(&planned.title).await? {
                            Some(record) => {
                                if dedup_enabled {
                                    existing.insert(planned.key.clone(), record.clone());
                                }
                                (record, true)
                            }
                            None => {
                                warn!(
                                    "Failed to create record '{}' (row {}), skipping",
                                    planned.title, planned.row_index
                                );
                                result.skipped += 1;
                                continue;
                            }
                        },
                    }
                }
            };

            write_row(&record, planned.row, &roles).await?;

            if is_new {
                result.created += 1;
            } else {
                result.updated += 1;
            }
        }

        info!("Import finished: {}", result);
        Ok(result)
    }

    /// Index existing records by deduplication key; later records win on collisions
    async fn index_existing(
        &self,
        dedup_key: &DedupKeySelector,
    ) -> Result<HashMap<RowKey, S::Record>, StorageError> {
        let mut index = HashMap::new();
        if *dedup_key == DedupKeySelector::None {
            return Ok(index);
        }

        let records = self.store.list_records().await?;
        let total = records.len();

        for record in records {
            let value = match dedup_key {
                DedupKeySelector::ByTitle => Some(record.title()),
                DedupKeySelector::ByProperty(property_id) => record.property_text(property_id),
                DedupKeySelector::None => None,
            };
            let Some(key) = value.map(|v| fold_key(&v)).filter(|k| !k.is_empty()) else {
                continue;
            };
            index.insert(RowKey::Value(key), record);
        }

        info!(
            "Found {} records in collection, {} usable for deduplication",
            total,
            index.len()
        );
        Ok(index)
    }

    async fn create_record(&self, title: &str) -> Result<Option<S::Record>, StorageError> {
        let Some(id) = self.store.create_record(title).await? else {
            return Ok(None);
        };
        self.store.fetch_record(&id).await
    }
}

/// Validate, plan and apply an import in one call
///
/// # Example
///
/// ```rust
/// use record_csv_import::import::{
///     ColumnMapping, DedupKeySelector, MappingTarget, parse_csv, reconcile,
/// };
/// use record_csv_import::models::{Collection, FieldDescriptor, FieldType};
/// use record_csv_import::storage::MemoryRecordStore;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = MemoryRecordStore::new(
///     Collection::new("Fruit").with_field(FieldDescriptor::new("qty", "Qty", FieldType::Number)),
/// );
/// let table = parse_csv("title,qty\nApple,5\nBanana,\n,9\n");
/// let mapping = ColumnMapping::new()
///     .with(0, MappingTarget::Title)
///     .with(1, MappingTarget::Property("qty".to_string()));
///
/// let result = reconcile(&table, &mapping, &DedupKeySelector::None, &store).await.unwrap();
/// assert_eq!((result.created, result.updated, result.skipped), (2, 0, 1));
/// # });
/// ```
pub async fn reconcile<S: RecordStore>(
    table: &ParsedTable,
    mapping: &ColumnMapping,
    dedup_key: &DedupKeySelector,
    store: &S,
) -> Result<ImportResult, ImportError> {
    let reconciler = Reconciler::new(store);
    let plan = reconciler.plan(table, mapping, dedup_key).await?;
    reconciler.apply(plan).await
}

fn row_key(
    dedup_key: &DedupKeySelector,
    roles: &ColumnRoles,
    row: &[String],
    row_index: usize,
    title: &str,
) -> RowKey {
    match dedup_key {
        DedupKeySelector::None => RowKey::Row(row_index),
        DedupKeySelector::ByTitle => RowKey::Value(fold_key(title)),
        DedupKeySelector::ByProperty(property_id) => match roles.property_column(property_id) {
            Some(column) => RowKey::Value(fold_key(cell(row, column.idx))),
            None => RowKey::Value(fold_key(title)),
        },
    }
}

/// Write property and body values of one row; blank values never overwrite
async fn write_row<R: RecordHandle>(
    record: &R,
    row: &[String],
    roles: &ColumnRoles,
) -> Result<(), StorageError> {
    for column in &roles.properties {
        let value = cell(row, column.idx).trim();
        if value.is_empty() {
            continue;
        }

        let mut written = record
            .set_property_text(&column.property_label, value)
            .await?;
        if !written && column.property_label != column.property_id {
            written = record.set_property_text(&column.property_id, value).await?;
        }
        if !written {
            debug!(
                "Record {} has no property '{}', value dropped",
                record.id(),
                column.property_id
            );
        }
    }

    if let Some(body_idx) = roles.body_idx {
        let body = cell(row, body_idx).trim();
        if !body.is_empty() {
            let blocks = record.content_blocks().await?;
            match blocks.first() {
                Some(first) => record.replace_block_text(first, body).await?,
                None => debug!("Record {} has no content blocks, body not set", record.id()),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::mapping::MappingTarget;
    use crate::import::parse_csv;
    use crate::models::{Collection, FieldDescriptor, FieldType, StoredRecord};
    use crate::storage::MemoryRecordStore;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn store() -> MemoryRecordStore {
        MemoryRecordStore::new(
            Collection::new("Fruit")
                .with_field(FieldDescriptor::new("qty", "Quantity", FieldType::Number))
                .with_field(FieldDescriptor::new("sku", "SKU", FieldType::Text))
                .with_record(StoredRecord::new(" APPLE ").with_property("sku", "a-1"))
                .with_record(StoredRecord::new("   ")),
        )
    }

    fn title_qty_mapping() -> ColumnMapping {
        ColumnMapping::new()
            .with(0, MappingTarget::Title)
            .with(1, MappingTarget::Property("qty".to_string()))
    }

    #[test]
    fn test_fold_key() {
        assert_eq!(fold_key("  Apple Pie "), "apple pie");
        assert_eq!(fold_key(" \t"), "");
    }

    #[test]
    fn test_plan_matches_existing_case_insensitively() {
        runtime().block_on(async {
            let store = store();
            let table = parse_csv("title,qty\napple,1\nBanana,2\n");
            let reconciler = Reconciler::new(&store);
            let plan = reconciler
                .plan(&table, &title_qty_mapping(), &DedupKeySelector::ByTitle)
                .await
                .unwrap();

            assert_eq!(plan.rows.len(), 2);
            assert!(matches!(plan.rows[0].action, PlannedAction::Update(_)));
            assert!(matches!(plan.rows[1].action, PlannedAction::Create));
            assert_eq!(plan.preview(), ImportResult { created: 1, updated: 1, skipped: 0 });
            // planning writes nothing
            assert_eq!(store.snapshot().unwrap().records.len(), 2);
        });
    }

    #[test]
    fn test_plan_keeps_first_position_last_value() {
        runtime().block_on(async {
            let store = store();
            let table = parse_csv("title,qty\nKiwi,1\nLime,2\nkiwi ,3\n");
            let plan = Reconciler::new(&store)
                .plan(&table, &title_qty_mapping(), &DedupKeySelector::ByTitle)
                .await
                .unwrap();

            let order: Vec<usize> = plan.rows.iter().map(|r| r.row_index).collect();
            assert_eq!(order, vec![2, 1]);
            assert_eq!(plan.rows[0].title, "kiwi");
            assert_eq!(plan.superseded, 1);
        });
    }

    #[test]
    fn test_plan_without_dedup_keeps_every_row() {
        runtime().block_on(async {
            let store = store();
            let table = parse_csv("title\nApple\nApple\n");
            let plan = Reconciler::new(&store)
                .plan(&table, &title_qty_mapping(), &DedupKeySelector::None)
                .await
                .unwrap();

            assert_eq!(plan.rows.len(), 2);
            assert_eq!(plan.rows[0].key, RowKey::Row(0));
            assert_eq!(plan.creates(), 2);
        });
    }

    #[test]
    fn test_property_key_falls_back_to_title() {
        runtime().block_on(async {
            let store = store();
            let table = parse_csv("title,qty\nApple,1\n");
            let plan = Reconciler::new(&store)
                .plan(
                    &table,
                    &title_qty_mapping(),
                    &DedupKeySelector::ByProperty("sku".to_string()),
                )
                .await
                .unwrap();

            // No column feeds "sku", so the row key is the title; the existing Apple
            // record is indexed by its sku value instead and does not match.
            assert_eq!(plan.rows[0].key, RowKey::Value("apple".to_string()));
            assert!(matches!(plan.rows[0].action, PlannedAction::Create));
        });
    }

    #[test]
    fn test_spec_example_counts() {
        runtime().block_on(async {
            let store = store();
            let table = parse_csv("title,qty\nApple,5\nBanana,\n,9\n");
            let result = reconcile(&table, &title_qty_mapping(), &DedupKeySelector::None, &store)
                .await
                .unwrap();
            assert_eq!(result, ImportResult { created: 2, updated: 0, skipped: 1 });

            let collection = store.snapshot().unwrap();
            let banana = collection.records.iter().find(|r| r.title == "Banana").unwrap();
            assert!(banana.properties.get("qty").is_none());
        });
    }

    #[test]
    fn test_invalid_mapping_touches_nothing() {
        runtime().block_on(async {
            let store = store();
            let table = parse_csv("a,b\nx,y\n");
            let mapping = ColumnMapping::new()
                .with(0, MappingTarget::Title)
                .with(1, MappingTarget::Title);
            let err = reconcile(&table, &mapping, &DedupKeySelector::ByTitle, &store)
                .await
                .unwrap_err();
            assert!(matches!(err, ImportError::Validation(_)));
            assert_eq!(store.snapshot().unwrap().records.len(), 2);
        });
    }
}
