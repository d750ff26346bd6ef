// 🏦 Asset
// Something the user owns (cash, gold, deposits, stock) at its current value

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
pub struct Asset {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "user")]
    pub owner_id: String,
    /// Kind of holding, e.g. "Cash", "Gold", "FD"
    pub asset_type: String,
    /// Human-readable label, e.g. "SBI Savings Account"
    pub name: String,
    pub value: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetDraft {
    pub asset_type: String,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPatch {
    pub asset_type: Option<String>,
    pub name: Option<String>,
    pub value: Option<f64>,
}

fn validate_fields(v: &mut Validator, body: &Value) -> AssetPatch {
    AssetPatch {
        asset_type: v.string("assetType", body.get("assetType"), "Asset type must be a string"),
        name: v.string("name", body.get("name"), "Name must be a string"),
        value: v.non_negative_number("value", body.get("value"), "Value must be a non-negative number"),
    }
}

fn asset_from_row(row: &Row) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        asset_type: row.get(2)?,
        name: row.get(3)?,
        value: row.get(4)?,
        created_at: parse_timestamp(5, row.get(5)?)?,
        updated_at: parse_timestamp(6, row.get(6)?)?,
    })
}

const SELECT_COLUMNS: &str =
    "SELECT id, owner_id, asset_type, name, value, created_at, updated_at FROM assets";

impl Owned for Asset {
    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Resource for Asset {
    const KIND: ResourceKind = ResourceKind::Asset;
    const TABLE: &'static str = "assets";

    type Draft = AssetDraft;
    type Patch = AssetPatch;

    fn validate_create(body: &Value) -> ValidationResult<AssetDraft> {
        let mut v = Validator::new();
        v.required("assetType", body.get("assetType"), "Asset type is required");
        v.required("name", body.get("name"), "Name is required");
        v.required("value", body.get("value"), "Value is required");
        let fields = validate_fields(&mut v, body);

        let draft = match (fields.asset_type, fields.name, fields.value) {
            (Some(asset_type), Some(name), Some(value)) => Some(AssetDraft { asset_type, name, value }),
            _ => None,
        };
        v.finish(draft)
    }

    fn validate_update(body: &Value) -> ValidationResult<AssetPatch> {
        let mut v = Validator::new();
        let patch = validate_fields(&mut v, body);
        v.finish(Some(patch))
    }

    fn insert(conn: &Connection, owner_id: &str, draft: AssetDraft) -> Result<Asset> {
        let now = Utc::now();
        let asset = Asset {
            id: new_id(),
            owner_id: owner_id.to_string(),
            asset_type: draft.asset_type,
            name: draft.name,
            value: draft.value,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO assets (id, owner_id, asset_type, name, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                asset.id,
                asset.owner_id,
                asset.asset_type,
                asset.name,
                asset.value,
                asset.created_at.to_rfc3339(),
                asset.updated_at.to_rfc3339(),
            ],
        )
        .context("Failed to insert asset")?;

        Ok(asset)
    }

    fn list_for_owner(conn: &Connection, owner_id: &str) -> Result<Vec<Asset>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE owner_id = ?1 ORDER BY created_at ASC, rowid ASC",
            SELECT_COLUMNS
        ))?;

        let assets = stmt
            .query_map([owner_id], asset_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list assets")?;

        Ok(assets)
    }

    fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Asset>> {
        conn.query_row(&format!("{} WHERE id = ?1", SELECT_COLUMNS), [id], asset_from_row)
            .optional()
            .context("Failed to load asset")
    }

    fn apply(mut self, patch: AssetPatch) -> Asset {
        if let Some(asset_type) = patch.asset_type {
            self.asset_type = asset_type;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        self.updated_at = Utc::now();
        self
    }

    fn save(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE assets SET asset_type = ?1, name = ?2, value = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                self.asset_type,
                self.name,
                self.value,
                self.updated_at.to_rfc3339(),
                self.id,
            ],
        )
        .context("Failed to update asset")?;
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
        let errors = Asset::validate_create(&json!({ "name": "Gold Necklace" })).unwrap_err();
        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Asset type is required", "Value is required"]);

        let errors = Asset::validate_create(&json!({ "assetType": "Gold", "name": "Ring", "value": -5 })).unwrap_err();
        assert_eq!(errors[0].field, "value");

        let draft = Asset::validate_create(&json!({ "assetType": "Cash", "name": "Wallet", "value": 0 })).unwrap();
        assert_eq!(draft.value, 0.0);
    }

    #[test]
    fn test_insert_list_update() {
        let (conn, owner) = setup();

        let draft = Asset::validate_create(&json!({
            "assetType": "Bank",
            "name": "SBI Savings Account",
            "value": 125000
        }))
        .unwrap();
        let asset = Asset::insert(&conn, &owner, draft).unwrap();

        let patch = Asset::validate_update(&json!({ "value": 130000 })).unwrap();
        asset.clone().apply(patch).save(&conn).unwrap();

        let listed = Asset::list_for_owner(&conn, &owner).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].value, 130000.0);
        assert_eq!(listed[0].name, "SBI Savings Account");
        assert_eq!(listed[0].owner_id, owner);
    }

    #[test]
    fn test_serialized_shape() {
        let (conn, owner) = setup();
        let draft = Asset::validate_create(&json!({ "assetType": "Gold", "name": "Coin", "value": 10 })).unwrap();
        let asset = Asset::insert(&conn, &owner, draft).unwrap();

        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["assetType"], "Gold");
        assert_eq!(json["user"], owner.as_str());
        assert!(json.get("_id").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
