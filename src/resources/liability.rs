// 📉 Liability
// A debt the user owes: loan, credit card, EMI, ...

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;

use super::Resource;
use crate::db::{new_id, parse_timestamp};
use crate::ownership::{Owned, ResourceKind};
use crate::validation::{ValidationResult, Validator};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Liability {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "user")]
    pub owner_id: String,
    #[serde(rename = "type")]
    pub liability_type: String,
    /// Total amount owed
    pub amount: f64,
    /// Percent, e.g. 12.5
    pub interest_rate: Option<f64>,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiabilityDraft {
    pub liability_type: String,
    pub amount: f64,
    pub interest_rate: Option<f64>,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiabilityPatch {
    pub liability_type: Option<String>,
    pub amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
}

fn validate_fields(v: &mut Validator, body: &Value) -> LiabilityPatch {
    LiabilityPatch {
        liability_type: v.string("type", body.get("type"), "Liability type must be a string"),
        amount: v.positive_number("amount", body.get("amount"), "Amount must be greater than 0"),
        interest_rate: v.positive_number(
            "interestRate",
            body.get("interestRate"),
            "Interest rate must be a positive number",
        ),
        due_date: v.date("dueDate", body.get("dueDate"), "Invalid date format"),
    }
}

fn liability_from_row(row: &Row) -> rusqlite::Result<Liability> {
    Ok(Liability {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        liability_type: row.get(2)?,
        amount: row.get(3)?,
        interest_rate: row.get(4)?,
        due_date: parse_timestamp(5, row.get(5)?)?,
        created_at: parse_timestamp(6, row.get(6)?)?,
        updated_at: parse_timestamp(7, row.get(7)?)?,
    })
}

const SELECT_COLUMNS: &str =
    "SELECT id, owner_id, type, amount, interest_rate, due_date, created_at, updated_at FROM liabilities";

impl Owned for Liability {
    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Resource for Liability {
    const KIND: ResourceKind = ResourceKind::Liability;
    const TABLE: &'static str = "liabilities";

    type Draft = LiabilityDraft;
    type Patch = LiabilityPatch;

    fn validate_create(body: &Value) -> ValidationResult<LiabilityDraft> {
        let mut v = Validator::new();
        v.required("type", body.get("type"), "Liability type is required");
        v.required("amount", body.get("amount"), "Amount is required");
        v.required("dueDate", body.get("dueDate"), "Due date is required");
        let fields = validate_fields(&mut v, body);

        let draft = match (fields.liability_type, fields.amount, fields.due_date) {
            (Some(liability_type), Some(amount), Some(due_date)) => Some(LiabilityDraft {
                liability_type,
                amount,
                interest_rate: fields.interest_rate,
                due_date,
            }),
            _ => None,
        };
        v.finish(draft)
    }

    fn validate_update(body: &Value) -> ValidationResult<LiabilityPatch> {
        let mut v = Validator::new();
        let patch = validate_fields(&mut v, body);
        v.finish(Some(patch))
    }

    fn insert(conn: &Connection, owner_id: &str, draft: LiabilityDraft) -> Result<Liability> {
        let now = Utc::now();
        let liability = Liability {
            id: new_id(),
            owner_id: owner_id.to_string(),
            liability_type: draft.liability_type,
            amount: draft.amount,
            interest_rate: draft.interest_rate,
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO liabilities (id, owner_id, type, amount, interest_rate, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                liability.id,
                liability.owner_id,
                liability.liability_type,
                liability.amount,
                liability.interest_rate,
                liability.due_date.to_rfc3339(),
                liability.created_at.to_rfc3339(),
                liability.updated_at.to_rfc3339(),
            ],
        )
        .context("Failed to insert liability")?;

        Ok(liability)
    }

    /// Nearest due date first
    fn list_for_owner(conn: &Connection, owner_id: &str) -> Result<Vec<Liability>> {
        let mut stmt = conn.prepare(&format!("{} WHERE owner_id = ?1 ORDER BY due_date ASC", SELECT_COLUMNS))?;

        let liabilities = stmt
            .query_map([owner_id], liability_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list liabilities")?;

        Ok(liabilities)
    }

    fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Liability>> {
        conn.query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], liability_from_row)
            .optional()
            .context("Failed to load liability")
    }

    fn apply(mut self, patch: LiabilityPatch) -> Liability {
        if let Some(liability_type) = patch.liability_type {
            self.liability_type = liability_type;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if patch.interest_rate.is_some() {
            self.interest_rate = patch.interest_rate;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        self.updated_at = Utc::now();
        self
    }

    fn save(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE liabilities
             SET type = ?1, amount = ?2, interest_rate = ?3, due_date = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                self.liability_type,
                self.amount,
                self.interest_rate,
                self.due_date.to_rfc3339(),
                self.updated_at.to_rfc3339(),
                self.id,
            ],
        )
        .context("Failed to update liability")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::users::{register_user, RegisterInput};
    use serde_json::json;

    fn setup() -> (Connection, String) {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let user = register_user(
            &conn,
            &RegisterInput {
                name: Some("Test".into()),
                email: Some("a@example.com".into()),
                password: Some("pw".into()),
            },
        )
        .unwrap();
        (conn, user.id)
    }

    #[test]
    fn test_create_validation() {
        let errors = Liability::validate_create(&json!({ "amount": 5000 })).unwrap_err();
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Liability type is required", "Due date is required"]);

        let errors = Liability::validate_create(&json!({
            "type": "Loan",
            "amount": 5000,
            "dueDate": "2025-06-01",
            "interestRate": 0
        }))
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Interest rate must be a positive number");

        let draft = Liability::validate_create(&json!({
            "type": "  Credit Card ",
            "amount": "1200.50",
            "dueDate": "2025-06-01",
            "interestRate": null
        }))
        .unwrap();
        assert_eq!(draft.liability_type, "Credit Card");
        assert_eq!(draft.interest_rate, None);
    }

    #[test]
    fn test_list_nearest_due_first() {
        let (conn, owner) = setup();

        for due in ["2025-12-01", "2025-01-15", "2025-06-30"] {
            let draft = Liability::validate_create(&json!({ "type": "EMI", "amount": 100, "dueDate": due })).unwrap();
            Liability::insert(&conn, &owner, draft).unwrap();
        }

        let listed = Liability::list_for_owner(&conn, &owner).unwrap();
        let months: Vec<String> = listed.iter().map(|l| l.due_date.format("%Y-%m").to_string()).collect();
        assert_eq!(months, vec!["2025-01", "2025-06", "2025-12"]);
    }

    #[test]
    fn test_serialized_type_field() {
        let (conn, owner) = setup();
        let draft = Liability::validate_create(&json!({
            "type": "Loan",
            "amount": 100,
            "dueDate": "2025-01-01T00:00:00Z",
            "interestRate": 12.5
        }))
        .unwrap();
        let liability = Liability::insert(&conn, &owner, draft).unwrap();

        let json = serde_json::to_value(&liability).unwrap();
        assert_eq!(json["type"], "Loan");
        assert_eq!(json["interestRate"], 12.5);
        assert!(json.get("dueDate").is_some());
    }
}
