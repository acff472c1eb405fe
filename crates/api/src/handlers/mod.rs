pub mod content;
pub mod skills;
pub mod subscribers;
pub mod uploads;

use folio_core::content::ContentType;
use folio_core::error::CoreError;
use folio_core::records::Reference;
use folio_db::repositories::ContentRepo;
use folio_db::DbPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Resolve a `{collection}` path segment. Unknown collections are 404.
pub(crate) fn resolve_collection(slug: &str) -> Result<ContentType, CoreError> {
    ContentType::from_slug(slug).ok_or_else(|| CoreError::NotFound {
        entity: "Collection",
        id: slug.to_string(),
    })
}

/// Parse a record id. A malformed id cannot exist, so it is reported as
/// not found rather than as a bad request.
pub(crate) fn parse_record_id(kind: ContentType, id: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(id).map_err(|_| CoreError::NotFound {
        entity: kind.entity_name(),
        id: id.to_string(),
    })
}

/// Check that every reference points at an existing record.
///
/// Returns a validation error naming the first dangling reference.
pub(crate) async fn check_references(pool: &DbPool, references: &[Reference]) -> AppResult<()> {
    for reference in references {
        let target = Uuid::parse_str(&reference.id).ok();
        let exists = match target {
            Some(id) => ContentRepo::exists(pool, reference.target.slug(), id).await?,
            None => false,
        };
        if !exists {
            return Err(AppError::Core(CoreError::Validation(format!(
                "{} references unknown {} '{}'",
                reference.field,
                reference.target.entity_name(),
                reference.id
            ))));
        }
    }
    Ok(())
}

/// Refuse to delete a record other records still point at.
///
/// Only categories are referenced today (by `Skill.categoryId`).
pub(crate) async fn ensure_unreferenced(
    pool: &DbPool,
    kind: ContentType,
    id: Uuid,
) -> AppResult<()> {
    if kind != ContentType::Categories {
        return Ok(());
    }
    let count = ContentRepo::count_referencing(
        pool,
        ContentType::Skills.slug(),
        "categoryId",
        &id.to_string(),
    )
    .await?;
    if count > 0 {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Category {id} is still used by {count} skill(s)"
        ))));
    }
    Ok(())
}
