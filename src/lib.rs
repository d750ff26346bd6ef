// Finance Tracker - Core Library
// Credential store, bearer tokens, access guard, ownership-checked resources

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ownership;
pub mod resources;
pub mod token;
pub mod users;
pub mod validation;

// Re-export commonly used types
pub use api::{build_router, AppState, CurrentUser};
pub use config::{ConfigError, ServerConfig};
pub use db::{open_database, setup_database};
pub use error::ApiError;
pub use ownership::{authorize, Action, Owned, ResourceKind};
pub use resources::{Asset, Expense, Liability, Resource};
pub use token::{Claims, TokenError, TokenIssuer};
pub use users::{authenticate, find_user_by_id, register_user, RegisterError, RegisterInput, User};
pub use validation::{ValidationError, ValidationResult, Validator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
