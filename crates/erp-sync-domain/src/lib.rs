//! Contracts shared between the ERP sync service and the callers that enqueue work.

pub mod pagination;
pub mod recipe;

pub use recipe::{
    MonetaryValue, RECIPE_UPSERT_EVENT, Recipe, RecipeMaterial, RecipeSyncCommand,
    RecipeSyncResult,
};
