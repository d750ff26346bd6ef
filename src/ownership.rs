// 🔒 Ownership Check
// A fetched record may only be read, changed or removed by its owner

use crate::error::ApiError;

/// Any record tagged with exactly one owning identity
pub trait Owned {
    fn id(&self) -> &str;
    fn owner_id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Expense,
    Asset,
    Liability,
}

impl ResourceKind {
    /// Capitalized name for messages ("Expense not found")
    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Expense => "Expense",
            ResourceKind::Asset => "Asset",
            ResourceKind::Liability => "Liability",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            ResourceKind::Expense => "expense",
            ResourceKind::Asset => "asset",
            ResourceKind::Liability => "liability",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Read => "access",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Gate a fetched record on ownership.
///
/// Absent → `NotFound`; owned by someone else → `Forbidden`.
pub fn authorize<T: Owned>(
    record: Option<T>,
    actor_id: &str,
    kind: ResourceKind,
    action: Action,
) -> Result<T, ApiError> {
    let record = record.ok_or_else(|| ApiError::NotFound(format!("{} not found", kind.title())))?;

    if record.owner_id() != actor_id {
        tracing::warn!(
            resource = kind.noun(),
            id = record.id(),
            actor = actor_id,
            action = action.verb(),
            "ownership check failed"
        );
        return Err(ApiError::Forbidden(format!(
            "Not authorized to {} this {}",
            action.verb(),
            kind.noun()
        )));
    }

    Ok(record)
}
