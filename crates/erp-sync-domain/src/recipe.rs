use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type tag for recipe upserts pushed to the inventory ERP.
pub const RECIPE_UPSERT_EVENT: &str = "inventory.recipe.upsert";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryValue {
    pub amount: f64,
    /// ISO 4217 code.
    pub currency: String,
}

/// One bill-of-materials line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeMaterial {
    pub material_code: String,
    pub description: String,
    #[serde(default)]
    pub hs_code: Option<String>,
    pub quantity: f64,
    pub unit_of_measure: String,
    #[serde(default)]
    pub unit_cost: Option<MonetaryValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub recipe_code: String,
    pub name: String,
    pub version: String,
    pub effective_from: DateTime<Utc>,
    #[serde(default)]
    pub materials: Vec<RecipeMaterial>,
}

/// Request to push one recipe to the downstream ERP.
///
/// `(tenant_id, idempotency_key)` identifies the request: resubmitting the same
/// pair never creates a second sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSyncCommand {
    pub tenant_id: Uuid,
    pub idempotency_key: String,
    pub recipe: Recipe,
    pub triggered_at: DateTime<Utc>,
    pub source_system: String,
    #[serde(default)]
    pub requested_by: Option<String>,
}

/// Outcome recorded once a recipe sync completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSyncResult {
    pub external_recipe_id: String,
    pub processed_at: DateTime<Utc>,
    pub attempts: u32,
    #[serde(default)]
    pub notes: Option<String>,
}
