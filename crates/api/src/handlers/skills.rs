//! Public skills section: categories with their skills.

use std::collections::HashMap;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::content::ContentType;
use folio_db::models::content_record::ContentRecord;
use folio_db::repositories::ContentRepo;
use serde_json::Value;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/skills/grouped
///
/// Returns every category in display order, each carrying a `skills` array
/// of the skills that reference it. Skills pointing at a missing category
/// are left out.
pub async fn grouped_skills(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let categories = ContentRepo::list(&state.pool, ContentType::Categories.slug()).await?;
    let skills = ContentRepo::list(&state.pool, ContentType::Skills.slug()).await?;

    Ok(Json(Value::Array(group_skills(&categories, &skills))))
}

fn group_skills(categories: &[ContentRecord], skills: &[ContentRecord]) -> Vec<Value> {
    let mut by_category: HashMap<String, Vec<Value>> = HashMap::new();
    for skill in skills {
        match skill.data.get("categoryId").and_then(Value::as_str) {
            Some(category_id) => by_category
                .entry(category_id.to_string())
                .or_default()
                .push(skill.to_document()),
            None => tracing::debug!(skill_id = %skill.id, "Skill without category skipped"),
        }
    }

    categories
        .iter()
        .map(|category| {
            let mut document = category.to_document();
            let members = by_category
                .remove(&category.id.to_string())
                .unwrap_or_default();
            if let Value::Object(map) = &mut document {
                map.insert("skills".to_string(), Value::Array(members));
            }
            document
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn record(collection: &str, data: Value) -> ContentRecord {
        ContentRecord {
            id: Uuid::new_v4(),
            collection: collection.into(),
            data,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_skills_land_under_their_category() {
        let frontend = record("categories", json!({"name": "Frontend", "color": "blue"}));
        let backend = record("categories", json!({"name": "Backend", "color": "green"}));
        let skills = vec![
            record(
                "skills",
                json!({"name": "Rust", "categoryId": backend.id.to_string()}),
            ),
            record(
                "skills",
                json!({"name": "Orphan", "categoryId": Uuid::new_v4().to_string()}),
            ),
        ];

        let grouped = group_skills(&[frontend, backend], &skills);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0]["skills"], json!([]));
        assert_eq!(grouped[1]["skills"][0]["name"], "Rust");
        assert_eq!(grouped[1]["skills"].as_array().unwrap().len(), 1);
    }
}
