// Owned resources: expenses, assets, liabilities
//
// Each kind supplies its schema (create/update validation), its row mapping
// and its list ordering. The HTTP handlers in `api::resources` are written
// once against the `Resource` trait, so the ownership check runs identically
// for every kind.

pub mod asset;
pub mod expense;
pub mod liability;

pub use asset::Asset;
pub use expense::{Expense, EXPENSE_CATEGORIES};
pub use liability::Liability;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;

use crate::ownership::{Owned, ResourceKind};
use crate::validation::ValidationResult;

pub trait Resource: Owned + Serialize + Sized + Send + 'static {
    const KIND: ResourceKind;
    const TABLE: &'static str;

    /// Validated create payload
    type Draft: Send;
    /// Validated update payload; absent fields keep stored values
    type Patch: Send;

    fn validate_create(body: &Value) -> ValidationResult<Self::Draft>;
    fn validate_update(body: &Value) -> ValidationResult<Self::Patch>;

    /// Insert a new record owned by `owner_id`
    fn insert(conn: &Connection, owner_id: &str, draft: Self::Draft) -> Result<Self>;

    /// Records owned by `owner_id`, filtered in the query itself
    fn list_for_owner(conn: &Connection, owner_id: &str) -> Result<Vec<Self>>;

    fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Self>>;

    /// Merge a patch into this record and bump `updated_at`
    fn apply(self, patch: Self::Patch) -> Self;

    /// Persist every mutable column. The owner column is never written.
    fn save(&self, conn: &Connection) -> Result<()>;

    fn delete(conn: &Connection, id: &str) -> Result<()> {
        conn.execute(&format!("DELETE FROM {} WHERE id = ?1", Self::TABLE), [id])
            .with_context(|| format!("Failed to delete {}", Self::KIND.noun()))?;
        Ok(())
    }
}
