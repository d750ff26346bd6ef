// 💸 Expense
// A single spend entry: positive amount, fixed category set, optional note

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;

use super::Resource;
use crate::db::{new_id, parse_timestamp};
use crate::ownership::{Owned, ResourceKind};
use crate::validation::{ValidationResult, Validator};

pub const EXPENSE_CATEGORIES: [&str; 8] = [
    "Food",
    "Transport",
    "Rent",
    "Utilities",
    "Shopping",
    "Health",
    "Entertainment",
    "Other",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "user")]
    pub owner_id: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub amount: f64,
    pub category: String,
    /// Defaults to the time of creation
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

const AMOUNT_POSITIVE: &str = "Amount must be greater than 0";
const INVALID_CATEGORY: &str = "Invalid category";
const INVALID_DATE: &str = "Invalid date format";
const DESCRIPTION_STRING: &str = "Description must be a string";

fn validate_fields(v: &mut Validator, body: &Value) -> ExpensePatch {
    ExpensePatch {
        amount: v.positive_number("amount", body.get("amount"), AMOUNT_POSITIVE),
        category: v.one_of("category", body.get("category"), &EXPENSE_CATEGORIES, INVALID_CATEGORY),
        date: v.date("date", body.get("date"), INVALID_DATE),
        description: v.string("description", body.get("description"), DESCRIPTION_STRING),
    }
}

fn expense_from_row(row: &Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        date: parse_timestamp(4, row.get(4)?)?,
        description: row.get(5)?,
        created_at: parse_timestamp(6, row.get(6)?)?,
        updated_at: parse_timestamp(7, row.get(7)?)?,
    })
}

const SELECT_COLUMNS: &str =
    "SELECT id, owner_id, amount, category, date, description, created_at, updated_at FROM expenses";

impl Owned for Expense {
    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Resource for Expense {
    const KIND: ResourceKind = ResourceKind::Expense;
    const TABLE: &'static str = "expenses";

    type Draft = ExpenseDraft;
    type Patch = ExpensePatch;

    fn validate_create(body: &Value) -> ValidationResult<ExpenseDraft> {
        let mut v = Validator::new();
        v.required("amount", body.get("amount"), "Amount is required");
        v.required("category", body.get("category"), "Category is required");
        let fields = validate_fields(&mut v, body);

        let draft = match (fields.amount, fields.category) {
            (Some(amount), Some(category)) => Some(ExpenseDraft {
                amount,
                category,
                date: fields.date,
                description: fields.description,
            }),
            _ => None,
        };
        v.finish(draft)
    }

    fn validate_update(body: &Value) -> ValidationResult<ExpensePatch> {
        let mut v = Validator::new();
        let patch = validate_fields(&mut v, body);
        v.finish(Some(patch))
    }

    fn insert(conn: &Connection, owner_id: &str, draft: ExpenseDraft) -> Result<Expense> {
        let now = Utc::now();
        let expense = Expense {
            id: new_id(),
            owner_id: owner_id.to_string(),
            amount: draft.amount,
            category: draft.category,
            date: draft.date.unwrap_or(now),
            description: draft.description,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO expenses (id, owner_id, amount, category, date, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                expense.id,
                expense.owner_id,
                expense.amount,
                expense.category,
                expense.date.to_rfc3339(),
                expense.description,
                expense.created_at.to_rfc3339(),
                expense.updated_at.to_rfc3339(),
            ],
        )
        .context("Failed to insert expense")?;

        Ok(expense)
    }

    /// Latest expenses first
    fn list_for_owner(conn: &Connection, owner_id: &str) -> Result<Vec<Expense>> {
        let mut stmt = conn.prepare(&format!("{} WHERE owner_id = ?1 ORDER BY date DESC", SELECT_COLUMNS))?;

        let expenses = stmt
            .query_map([owner_id], expense_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list expenses")?;

        Ok(expenses)
    }

    fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Expense>> {
        conn.query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], expense_from_row)
            .optional()
            .context("Failed to load expense")
    }

    fn apply(mut self, patch: ExpensePatch) -> Expense {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        self.updated_at = Utc::now();
        self
    }

    fn save(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE expenses
             SET amount = ?1, category = ?2, date = ?3, description = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                self.amount,
                self.category,
                self.date.to_rfc3339(),
                self.description,
                self.updated_at.to_rfc3339(),
                self.id,
            ],
        )
        .context("Failed to update expense")?;
        Ok(())
    }
}
