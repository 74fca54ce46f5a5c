//! Domain entities exchanged with the client app.
//!
//! Project `content` is the editor's block document; the server stores and
//! returns it untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workflow stage, shared by tasks and kanban columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Todo,
    Doing,
    Done,
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Todo
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<serde_json::Value>,
    pub published: Option<bool>,
}

impl Project {
    pub fn create(owner_id: &str, req: CreateProject) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: req.name,
            description: req.description,
            content: req.content,
            published: req.published,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        self.updated_at = Utc::now();
    }
}

/// Restricted projection served by the public endpoint. Never exposes the
/// owner, publication flag, tasks, or kanban data.
#[derive(Debug, Serialize)]
pub struct PublicProject {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for PublicProject {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            content: project.content.clone(),
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub status: Stage,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<Stage>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    pub fn create(owner_id: &str, req: CreateTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            project_id: req.project_id,
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanbanCard {
    pub id: String,
    pub owner_id: String,
    pub column: Stage,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCard {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub column: Stage,
    #[serde(default)]
    pub position: i32,
}

/// Kanban cards are addressed through the collection route, so the patch
/// carries its own id.
#[derive(Debug, Deserialize)]
pub struct CardPatch {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub column: Option<Stage>,
    pub position: Option<i32>,
}

impl KanbanCard {
    pub fn create(owner_id: &str, req: CreateCard) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            column: req.column,
            title: req.title,
            description: req.description,
            position: req.position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: CardPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(column) = patch.column {
            self.column = column;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_projection_drops_private_fields() {
        let project = Project::create(
            "owner-1",
            CreateProject {
                name: "កំណត់ត្រា".to_string(),
                description: Some("test".to_string()),
                content: json!([{ "type": "paragraph" }]),
                published: true,
            },
        );

        let public = PublicProject::from(&project);
        let value = serde_json::to_value(&public).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert!(keys.iter().all(|k| {
            matches!(
                k.as_str(),
                "id" | "name" | "description" | "content" | "updated_at"
            )
        }));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut project = Project::create(
            "owner-1",
            CreateProject {
                name: "old".to_string(),
                description: None,
                content: serde_json::Value::Null,
                published: false,
            },
        );

        project.apply(ProjectPatch {
            published: Some(true),
            ..Default::default()
        });
        assert_eq!(project.name, "old");
        assert!(project.published);
    }

    #[test]
    fn stage_uses_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&Stage::Doing).unwrap(), "\"doing\"");
        let parsed: Stage = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(parsed, Stage::Done);
    }
}
