use axum::{extract::Path, Json};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::services::faq::{FaqEntry, FAQS};
use crate::utils::error::ApiError;

/// `GET /faqs` — the full static table.
pub async fn all_faqs() -> Json<&'static BTreeMap<&'static str, Vec<FaqEntry>>> {
    Json(&*FAQS)
}

/// `GET /faqs/{category}` — one category, 404 for unknown names.
pub async fn category_faqs(Path(category): Path<String>) -> Result<Json<Value>, ApiError> {
    let entries = FAQS
        .get(category.as_str())
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    let value = serde_json::to_value(entries)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize FAQs: {}", e)))?;
    let mut body = Map::new();
    body.insert(category, value);
    Ok(Json(Value::Object(body)))
}
