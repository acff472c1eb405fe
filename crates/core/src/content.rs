//! Content type registry.
//!
//! Every admin editor works against exactly one content type. The type
//! decides the REST slug, the JSON keys used by the bulk envelopes, whether
//! records carry an uploadable image, and which delete discipline the editor
//! follows.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;
use crate::records::{
    Category, Certification, Content, Education, Experience, NowItem, Project, Reference, Skill,
    Stat, TimelineGoal,
};

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

/// A collection of records managed through one admin editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    Stats,
    Education,
    Certifications,
    Timelines,
    Experiences,
    Categories,
    Skills,
    Projects,
    Now,
}

/// How an editor applies a delete request for a persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// The DELETE call is issued as soon as the user asks; a spinner shows
    /// per row and the record comes back if the server refuses.
    Immediate,
    /// The id is queued and sent with the next bulk save.
    Deferred,
}

impl ContentType {
    /// Every supported content type, in sidebar order.
    pub const fn all() -> &'static [ContentType] {
        &[
            ContentType::Stats,
            ContentType::Education,
            ContentType::Certifications,
            ContentType::Timelines,
            ContentType::Experiences,
            ContentType::Categories,
            ContentType::Skills,
            ContentType::Projects,
            ContentType::Now,
        ]
    }

    /// Resolve a URL path segment (`/api/{slug}`) to a content type.
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.slug() == slug)
    }

    /// URL path segment and storage collection name.
    pub const fn slug(self) -> &'static str {
        match self {
            ContentType::Stats => "stats",
            ContentType::Education => "education",
            ContentType::Certifications => "certifications",
            ContentType::Timelines => "timelines",
            ContentType::Experiences => "experiences",
            ContentType::Categories => "categories",
            ContentType::Skills => "skills",
            ContentType::Projects => "projects",
            ContentType::Now => "now",
        }
    }

    /// Key holding the record array in a list response.
    pub const fn list_key(self) -> &'static str {
        self.slug()
    }

    /// Key holding updated records in a bulk update request.
    pub const fn update_key(self) -> &'static str {
        match self {
            ContentType::Stats => "updatedStats",
            ContentType::Education => "updatedEducation",
            ContentType::Certifications => "updatedCertifications",
            ContentType::Timelines => "updatedTimelines",
            ContentType::Experiences => "updatedExperiences",
            ContentType::Categories => "updatedCategories",
            ContentType::Skills => "updatedSkills",
            ContentType::Projects => "updatedProjects",
            ContentType::Now => "updatedNow",
        }
    }

    /// Key holding new records in a bulk create request.
    pub const fn create_key(self) -> &'static str {
        match self {
            ContentType::Stats => "newStats",
            ContentType::Education => "newEducation",
            ContentType::Certifications => "newCertifications",
            ContentType::Timelines => "newTimelines",
            ContentType::Experiences => "newExperiences",
            ContentType::Categories => "newCategories",
            ContentType::Skills => "newSkills",
            ContentType::Projects => "newProjects",
            ContentType::Now => "newNow",
        }
    }

    /// Singular entity name used in error messages.
    pub const fn entity_name(self) -> &'static str {
        match self {
            ContentType::Stats => "Stat",
            ContentType::Education => "Education",
            ContentType::Certifications => "Certification",
            ContentType::Timelines => "Timeline",
            ContentType::Experiences => "Experience",
            ContentType::Categories => "Category",
            ContentType::Skills => "Skill",
            ContentType::Projects => "Project",
            ContentType::Now => "NowItem",
        }
    }

    /// Field that receives the public URL of an uploaded image, if any.
    pub const fn image_field(self) -> Option<&'static str> {
        match self {
            ContentType::Skills => Some("icon"),
            ContentType::Projects => Some("image"),
            _ => None,
        }
    }

    /// Delete discipline of the editor for this content type.
    pub const fn delete_mode(self) -> DeleteMode {
        match self {
            ContentType::Timelines
            | ContentType::Experiences
            | ContentType::Projects
            | ContentType::Now => DeleteMode::Immediate,
            ContentType::Stats
            | ContentType::Education
            | ContentType::Certifications
            | ContentType::Categories
            | ContentType::Skills => DeleteMode::Deferred,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

// ---------------------------------------------------------------------------
// Document validation
// ---------------------------------------------------------------------------

/// A document that passed validation for its content type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDocument {
    /// The normalized JSON object (trimmed strings, defaults filled in).
    pub data: serde_json::Value,
    /// Foreign keys carried by the document.
    pub references: Vec<Reference>,
}

/// Validate and normalize an untyped JSON document against the closed
/// record type of `kind`.
///
/// Fields outside the record type (including `_id`, `createdAt` and
/// `updatedAt`) are dropped from the result.
pub fn validate_document(
    kind: ContentType,
    document: &serde_json::Value,
) -> Result<ValidatedDocument, CoreError> {
    match kind {
        ContentType::Stats => validate_as::<Stat>(document),
        ContentType::Education => validate_as::<Education>(document),
        ContentType::Certifications => validate_as::<Certification>(document),
        ContentType::Timelines => validate_as::<TimelineGoal>(document),
        ContentType::Experiences => validate_as::<Experience>(document),
        ContentType::Categories => validate_as::<Category>(document),
        ContentType::Skills => validate_as::<Skill>(document),
        ContentType::Projects => validate_as::<Project>(document),
        ContentType::Now => validate_as::<NowItem>(document),
    }
}

fn validate_as<T>(document: &serde_json::Value) -> Result<ValidatedDocument, CoreError>
where
    T: Content + Serialize + DeserializeOwned,
{
    if !document.is_object() {
        return Err(CoreError::Validation(format!(
            "{} must be a JSON object",
            T::KIND.entity_name()
        )));
    }

    let mut record: T = serde_json::from_value(document.clone()).map_err(|e| {
        CoreError::Validation(format!("Invalid {}: {e}", T::KIND.entity_name()))
    })?;
    record.normalize();
    record.check()?;

    let references = record.references();
    let data = serde_json::to_value(&record)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize record: {e}")))?;

    Ok(ValidatedDocument { data, references })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slug_round_trip_for_every_type() {
        for kind in ContentType::all() {
            assert_eq!(ContentType::from_slug(kind.slug()), Some(*kind));
        }
    }

    #[test]
    fn test_unknown_slug_is_rejected() {
        assert_eq!(ContentType::from_slug("subscribers"), None);
        assert_eq!(ContentType::from_slug(""), None);
    }

    #[test]
    fn test_envelope_keys_follow_collection_name() {
        assert_eq!(ContentType::Education.update_key(), "updatedEducation");
        assert_eq!(ContentType::Education.create_key(), "newEducation");
        assert_eq!(ContentType::Certifications.list_key(), "certifications");
    }

    #[test]
    fn test_only_projects_and_skills_accept_images() {
        let with_images: Vec<_> = ContentType::all()
            .iter()
            .filter(|k| k.image_field().is_some())
            .collect();
        assert_eq!(with_images, vec![&ContentType::Skills, &ContentType::Projects]);
    }

    #[test]
    fn test_validate_document_trims_and_drops_unknown_fields() {
        let doc = json!({
            "_id": "abc",
            "degree": "  BSc Computer Science ",
            "institution": "Uni",
            "period": "2018 - 2022",
            "description": "Systems track",
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let validated = validate_document(ContentType::Education, &doc).unwrap();
        assert_eq!(validated.data["degree"], "BSc Computer Science");
        assert!(validated.data.get("_id").is_none());
        assert!(validated.data.get("createdAt").is_none());
        assert!(validated.references.is_empty());
    }

    #[test]
    fn test_validate_document_keeps_timeline_background() {
        let doc = json!({
            "title": "Launch",
            "icon": "Target",
            "color": "blue",
            "bgColor": "bg-blue-500/10"
        });
        let validated = validate_document(ContentType::Timelines, &doc).unwrap();
        assert_eq!(validated.data["bgColor"], "bg-blue-500/10");
    }

    #[test]
    fn test_validate_document_rejects_missing_required_field() {
        let doc = json!({ "issuer": "AWS", "date": "2023" });
        let err = validate_document(ContentType::Certifications, &doc).unwrap_err();
        assert!(err.to_string().contains("Certification"));
    }

    #[test]
    fn test_validate_document_rejects_non_object() {
        let err = validate_document(ContentType::Stats, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_skill_document_reports_category_reference() {
        let doc = json!({
            "name": "Rust",
            "icon": "/uploads/rust.png",
            "level": 80,
            "categoryId": "7c9e6679-7425-40de-944b-e07fc1f90ae7"
        });
        let validated = validate_document(ContentType::Skills, &doc).unwrap();
        assert_eq!(validated.references.len(), 1);
        assert_eq!(validated.references[0].target, ContentType::Categories);
    }
}
