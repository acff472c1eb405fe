//! Closed record types, one per content type.
//!
//! Field names are camelCase on the wire. Enumerated fields are real enums
//! so an unknown color or status fails deserialization instead of reaching
//! the store. Length and range rules are declared with `validator` and
//! surfaced as [`CoreError::Validation`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::content::ContentType;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Content trait
// ---------------------------------------------------------------------------

/// A foreign key carried by a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Wire name of the referencing field.
    pub field: &'static str,
    /// Collection the id must exist in.
    pub target: ContentType,
    /// The referenced persistent id.
    pub id: String,
}

/// Behaviour shared by every record type.
pub trait Content:
    Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static
{
    /// The collection this record type belongs to.
    const KIND: ContentType;

    /// Trim free-text fields.
    fn normalize(&mut self);

    /// Field-level validation.
    fn check(&self) -> Result<(), CoreError>;

    /// Foreign keys carried by this record.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Values shown in the form when the user adds a new record.
    fn placeholder() -> Self;
}

/// Flatten `validator` errors into one readable, deterministic message.
fn validation_message(kind: ContentType, errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let reasons: Vec<String> = errs
                .iter()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            format!("{field}: {}", reasons.join(", "))
        })
        .collect();
    parts.sort();
    format!("Invalid {}: {}", kind.entity_name(), parts.join("; "))
}

fn run_validator<T: Validate + Content>(record: &T) -> Result<(), CoreError> {
    record
        .validate()
        .map_err(|e| CoreError::Validation(validation_message(T::KIND, &e)))
}

fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn trim_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        trim(v);
    }
}

fn default_link() -> String {
    "#".to_string()
}

// ---------------------------------------------------------------------------
// Shared enumerations
// ---------------------------------------------------------------------------

/// Accent color palette used across the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Blue,
    Purple,
    Pink,
    Green,
    Amber,
    Indigo,
    Rose,
}

/// Progress state of a goal on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    Completed,
    InProgress,
    Planning,
    #[default]
    NotStarted,
}

/// Icon of a "what I'm doing now" card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NowIcon {
    #[default]
    Code,
    BookOpen,
    Briefcase,
    Coffee,
    Music,
}

/// Status badge of a "what I'm doing now" card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NowStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    Ongoing,
    Active,
    #[default]
    New,
    Planning,
    Completed,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// An animated counter in the stats section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    #[validate(length(min = 1, message = "icon is required"))]
    pub icon: String,
    #[validate(range(min = 0, message = "value cannot be negative"))]
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[validate(length(min = 1, max = 60, message = "label must be 1-60 characters"))]
    pub label: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub order: i32,
}

impl Content for Stat {
    const KIND: ContentType = ContentType::Stats;

    fn normalize(&mut self) {
        trim(&mut self.icon);
        trim(&mut self.label);
        trim_opt(&mut self.suffix);
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)
    }

    fn placeholder() -> Self {
        Self {
            icon: "Award".into(),
            value: 0,
            suffix: Some("+".into()),
            label: "New Stat".into(),
            color: Color::Blue,
            order: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Education
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[validate(length(min = 1, message = "Please provide a degree or course name"))]
    pub degree: String,
    #[validate(length(min = 1, message = "Please provide an institution name"))]
    pub institution: String,
    #[validate(length(min = 1, message = "Please provide a time period"))]
    pub period: String,
    #[validate(length(min = 1, message = "Please provide a description"))]
    pub description: String,
    #[serde(default)]
    pub order: i32,
}

impl Content for Education {
    const KIND: ContentType = ContentType::Education;

    fn normalize(&mut self) {
        trim(&mut self.degree);
        trim(&mut self.institution);
        trim(&mut self.period);
        trim(&mut self.description);
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)
    }

    fn placeholder() -> Self {
        Self {
            degree: "New Degree/Course".into(),
            institution: "Institution Name".into(),
            period: "Start - End".into(),
            description: "Description of your education".into(),
            order: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Certifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    #[validate(length(min = 1, message = "Please provide a certification name"))]
    pub name: String,
    #[validate(length(min = 1, message = "Please provide an issuing organization"))]
    pub issuer: String,
    #[validate(length(min = 1, message = "Please provide a date or year of certification"))]
    pub date: String,
    #[serde(default)]
    pub order: i32,
}

impl Content for Certification {
    const KIND: ContentType = ContentType::Certifications;

    fn normalize(&mut self) {
        trim(&mut self.name);
        trim(&mut self.issuer);
        trim(&mut self.date);
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)
    }

    fn placeholder() -> Self {
        Self {
            name: "New Certification".into(),
            issuer: "Issuing Organization".into(),
            date: "Year".into(),
            order: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Timeline goals
// ---------------------------------------------------------------------------

/// A milestone on the goals timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimelineGoal {
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub status: GoalStatus,
    #[validate(length(min = 1, message = "icon is required"))]
    pub icon: String,
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub category: String,
    /// Palette name (`blue`) or the text class the timeline renders
    /// (`text-blue-500`).
    #[serde(default = "default_timeline_color")]
    pub color: String,
    /// Background class of the timeline dot and badge.
    #[serde(default)]
    pub bg_color: String,
}

fn default_timeline_color() -> String {
    "blue".to_string()
}

impl Content for TimelineGoal {
    const KIND: ContentType = ContentType::Timelines;

    fn normalize(&mut self) {
        trim(&mut self.title);
        trim(&mut self.description);
        trim(&mut self.details);
        trim(&mut self.icon);
        trim(&mut self.timeframe);
        trim(&mut self.category);
        trim(&mut self.color);
        trim(&mut self.bg_color);
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)?;
        let name = self
            .color
            .strip_prefix("text-")
            .and_then(|c| c.strip_suffix("-500"))
            .unwrap_or(&self.color);
        if serde_json::from_value::<Color>(serde_json::Value::String(name.to_string())).is_err() {
            return Err(CoreError::Validation(format!(
                "Invalid {}: color: unknown color '{}'",
                Self::KIND.entity_name(),
                self.color
            )));
        }
        Ok(())
    }

    fn placeholder() -> Self {
        Self {
            title: "New Goal".into(),
            description: "Description of your new goal or milestone".into(),
            details: "Detailed information about this goal".into(),
            status: GoalStatus::NotStarted,
            icon: "Target".into(),
            timeframe: "January 2025".into(),
            category: "New Category".into(),
            color: default_timeline_color(),
            bg_color: "bg-blue-500/10".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Experience
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[validate(length(min = 1, message = "Please provide a role/position"))]
    pub role: String,
    #[validate(length(min = 1, message = "Please provide a company name"))]
    pub company: String,
    #[validate(length(min = 1, message = "Please provide a time period"))]
    pub period: String,
    #[validate(length(min = 1, message = "Please provide a job description"))]
    pub description: String,
    #[serde(default)]
    pub order: i32,
}

impl Content for Experience {
    const KIND: ContentType = ContentType::Experiences;

    fn normalize(&mut self) {
        trim(&mut self.role);
        trim(&mut self.company);
        trim(&mut self.period);
        trim(&mut self.description);
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)
    }

    fn placeholder() -> Self {
        Self {
            role: "New Role".into(),
            company: "Company Name".into(),
            period: "Start - End".into(),
            description: "What you worked on".into(),
            order: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Skill categories and skills
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[validate(length(
        min = 1,
        max = 60,
        message = "Category name must be 1-60 characters"
    ))]
    pub name: String,
    pub color: Color,
}

impl Content for Category {
    const KIND: ContentType = ContentType::Categories;

    fn normalize(&mut self) {
        trim(&mut self.name);
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)
    }

    fn placeholder() -> Self {
        Self {
            name: "New Category".into(),
            color: Color::Blue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[validate(length(min = 1, max = 60, message = "Skill name must be 1-60 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Please provide an icon URL"))]
    pub icon: String,
    #[validate(range(min = 0, max = 100, message = "Level must be between 0 and 100"))]
    pub level: i32,
    #[validate(length(min = 1, message = "Please provide a category ID"))]
    pub category_id: String,
    /// Stored upload backing `icon`, removed when the skill is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Content for Skill {
    const KIND: ContentType = ContentType::Skills;

    fn normalize(&mut self) {
        trim(&mut self.name);
        trim(&mut self.icon);
        trim(&mut self.category_id);
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference {
            field: "categoryId",
            target: ContentType::Categories,
            id: self.category_id.clone(),
        }]
    }

    fn placeholder() -> Self {
        Self {
            name: "New Skill".into(),
            icon: "/placeholder.svg".into(),
            level: 50,
            category_id: String::new(),
            filename: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[validate(length(min = 1, max = 100, message = "Title cannot be more than 100 characters"))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Description cannot be more than 1000 characters"
    ))]
    pub description: String,
    #[serde(default = "Project::default_image")]
    pub image: String,
    /// Stored upload backing `image`, removed when the project is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_link")]
    pub live_url: String,
    #[serde(default = "default_link")]
    #[validate(length(min = 1, message = "Please provide a GitHub URL"))]
    pub github_url: String,
}

impl Project {
    fn default_image() -> String {
        "/placeholder.svg?height=400&width=600".to_string()
    }
}

impl Content for Project {
    const KIND: ContentType = ContentType::Projects;

    fn normalize(&mut self) {
        trim(&mut self.title);
        trim(&mut self.description);
        trim(&mut self.live_url);
        trim(&mut self.github_url);
        for tag in &mut self.tags {
            trim(tag);
        }
        self.tags.retain(|t| !t.is_empty());
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)
    }

    fn placeholder() -> Self {
        Self {
            title: "New Project".into(),
            description: "Describe the project".into(),
            image: Self::default_image(),
            filename: None,
            tags: Vec::new(),
            live_url: default_link(),
            github_url: default_link(),
        }
    }
}

// ---------------------------------------------------------------------------
// Now items
// ---------------------------------------------------------------------------

/// A "what I'm doing now" card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NowItem {
    #[serde(default)]
    pub icon: NowIcon,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default)]
    pub status: NowStatus,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "progress must be between 0 and 100"))]
    pub progress: i32,
    #[serde(default)]
    pub order: i32,
}

impl Content for NowItem {
    const KIND: ContentType = ContentType::Now;

    fn normalize(&mut self) {
        trim(&mut self.title);
        trim(&mut self.description);
        trim(&mut self.link);
    }

    fn check(&self) -> Result<(), CoreError> {
        run_validator(self)
    }

    fn placeholder() -> Self {
        Self {
            icon: NowIcon::Code,
            title: "New Item".into(),
            description: "What are you working on?".into(),
            color: Color::Blue,
            link: default_link(),
            status: NowStatus::New,
            progress: 0,
            order: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholders_are_valid_except_unassigned_skill() {
        assert!(Stat::placeholder().check().is_ok());
        assert!(Education::placeholder().check().is_ok());
        assert!(Certification::placeholder().check().is_ok());
        assert!(TimelineGoal::placeholder().check().is_ok());
        assert!(Experience::placeholder().check().is_ok());
        assert!(Category::placeholder().check().is_ok());
        assert!(Project::placeholder().check().is_ok());
        assert!(NowItem::placeholder().check().is_ok());
        // A new skill must be assigned to a category before publishing.
        assert!(Skill::placeholder().check().is_err());
    }

    #[test]
    fn test_skill_level_out_of_range() {
        let mut skill = Skill::placeholder();
        skill.category_id = "cat".into();
        skill.level = 101;
        let msg = skill.check().unwrap_err().to_string();
        assert!(msg.contains("Level must be between 0 and 100"), "{msg}");
    }

    #[test]
    fn test_category_name_too_long() {
        let category = Category {
            name: "x".repeat(61),
            color: Color::Rose,
        };
        assert!(category.check().is_err());
    }

    #[test]
    fn test_unknown_color_fails_deserialization() {
        let result = serde_json::from_value::<Category>(json!({"name": "Web", "color": "teal"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_timeline_accepts_seeded_color_classes() {
        let goal: TimelineGoal = serde_json::from_value(json!({
            "title": "Launch Personal Blog",
            "icon": "Target",
            "status": "planning",
            "color": "text-blue-500",
            "bgColor": "bg-blue-500/10"
        }))
        .unwrap();
        assert!(goal.check().is_ok());

        let value = serde_json::to_value(&goal).unwrap();
        assert_eq!(value["color"], "text-blue-500");
        assert_eq!(value["bgColor"], "bg-blue-500/10");
    }

    #[test]
    fn test_timeline_rejects_unknown_color() {
        let mut goal = TimelineGoal::placeholder();
        goal.color = "text-teal-500".into();
        let msg = goal.check().unwrap_err().to_string();
        assert!(msg.contains("unknown color 'text-teal-500'"), "{msg}");
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(GoalStatus::InProgress).unwrap(),
            json!("in-progress")
        );
        assert_eq!(
            serde_json::to_value(NowStatus::InProgress).unwrap(),
            json!("In Progress")
        );
        assert_eq!(serde_json::to_value(NowIcon::BookOpen).unwrap(), json!("BookOpen"));
    }

    #[test]
    fn test_project_defaults_and_tag_normalization() {
        let mut project: Project = serde_json::from_value(json!({
            "title": " Folio ",
            "description": "Portfolio site",
            "tags": [" rust ", "", "axum"]
        }))
        .unwrap();
        project.normalize();
        assert_eq!(project.title, "Folio");
        assert_eq!(project.tags, vec!["rust", "axum"]);
        assert_eq!(project.live_url, "#");
        assert!(project.image.starts_with("/placeholder.svg"));
    }

    #[test]
    fn test_camel_case_wire_fields() {
        let value = serde_json::to_value(Skill {
            name: "Rust".into(),
            icon: "/i.png".into(),
            level: 90,
            category_id: "c1".into(),
            filename: None,
        })
        .unwrap();
        assert_eq!(value["categoryId"], "c1");
        assert!(value.get("filename").is_none());
    }
}
