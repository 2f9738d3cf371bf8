//! Settings database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single key/value settings row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingDbModel {
    pub key: String,
    pub value: String,
}
