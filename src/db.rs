//! Persistence boundary.
//!
//! A real deployment talks to its database through this trait; the bundled
//! implementation keeps everything in process memory, which is also what
//! the tests run against.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{KanbanCard, Project, Task, User};

#[async_trait]
pub trait Database: Send + Sync {
    async fn list_projects(&self, owner_id: &str) -> Result<Vec<Project>>;
    async fn insert_project(&self, project: Project) -> Result<Project>;
    async fn get_project(&self, id: &str) -> Result<Option<Project>>;
    async fn update_project(&self, project: Project) -> Result<Project>;
    /// Removes the project and its tasks. Returns whether it existed.
    async fn delete_project(&self, id: &str) -> Result<bool>;

    async fn list_tasks(&self, owner_id: &str, project_id: Option<&str>) -> Result<Vec<Task>>;
    async fn insert_task(&self, task: Task) -> Result<Task>;
    async fn get_task(&self, id: &str) -> Result<Option<Task>>;
    async fn update_task(&self, task: Task) -> Result<Task>;
    async fn delete_task(&self, id: &str) -> Result<bool>;

    async fn list_cards(&self, owner_id: &str) -> Result<Vec<KanbanCard>>;
    async fn insert_card(&self, card: KanbanCard) -> Result<KanbanCard>;
    async fn get_card(&self, id: &str) -> Result<Option<KanbanCard>>;
    async fn update_card(&self, card: KanbanCard) -> Result<KanbanCard>;
    async fn delete_card(&self, id: &str) -> Result<bool>;

    async fn list_users(&self) -> Result<Vec<User>>;
    async fn upsert_user(&self, user: User) -> Result<User>;
}

#[derive(Default)]
pub struct MemoryDatabase {
    projects: RwLock<HashMap<String, Project>>,
    tasks: RwLock<HashMap<String, Task>>,
    cards: RwLock<HashMap<String, KanbanCard>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn list_projects(&self, owner_id: &str) -> Result<Vec<Project>> {
        let projects = self.projects.read().await;
        let mut list: Vec<Project> = projects
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn insert_project(&self, project: Project) -> Result<Project> {
        let mut projects = self.projects.write().await;
        projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.projects.read().await.get(id).cloned())
    }

    async fn update_project(&self, project: Project) -> Result<Project> {
        let mut projects = self.projects.write().await;
        projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn delete_project(&self, id: &str) -> Result<bool> {
        let existed = self.projects.write().await.remove(id).is_some();
        if existed {
            let mut tasks = self.tasks.write().await;
            tasks.retain(|_, task| task.project_id.as_deref() != Some(id));
        }
        Ok(existed)
    }

    async fn list_tasks(&self, owner_id: &str, project_id: Option<&str>) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut list: Vec<Task> = tasks
            .values()
            .filter(|t| t.owner_id == owner_id)
            .filter(|t| match project_id {
                Some(pid) => t.project_id.as_deref() == Some(pid),
                None => true,
            })
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    async fn insert_task(&self, task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn update_task(&self, task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn delete_task(&self, id: &str) -> Result<bool> {
        Ok(self.tasks.write().await.remove(id).is_some())
    }

    async fn list_cards(&self, owner_id: &str) -> Result<Vec<KanbanCard>> {
        let cards = self.cards.read().await;
        let mut list: Vec<KanbanCard> = cards
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        list.sort_by_key(|c| (c.column as u8, c.position));
        Ok(list)
    }

    async fn insert_card(&self, card: KanbanCard) -> Result<KanbanCard> {
        let mut cards = self.cards.write().await;
        cards.insert(card.id.clone(), card.clone());
        Ok(card)
    }

    async fn get_card(&self, id: &str) -> Result<Option<KanbanCard>> {
        Ok(self.cards.read().await.get(id).cloned())
    }

    async fn update_card(&self, card: KanbanCard) -> Result<KanbanCard> {
        let mut cards = self.cards.write().await;
        cards.insert(card.id.clone(), card.clone());
        Ok(card)
    }

    async fn delete_card(&self, id: &str) -> Result<bool> {
        Ok(self.cards.write().await.remove(id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut list: Vec<User> = users.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    async fn upsert_user(&self, user: User) -> Result<User> {
        let mut users = self.users.write().await;
        // Keep the original creation time on re-upsert.
        let user = match users.get(&user.id) {
            Some(existing) => User {
                created_at: existing.created_at,
                ..user
            },
            None => user,
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProject, CreateTask, Stage};

    fn project(owner: &str, name: &str) -> Project {
        Project::create(
            owner,
            CreateProject {
                name: name.to_string(),
                description: None,
                content: serde_json::Value::Null,
                published: false,
            },
        )
    }

    #[tokio::test]
    async fn listing_is_scoped_to_owner() {
        let db = MemoryDatabase::new();
        db.insert_project(project("alice", "a")).await.unwrap();
        db.insert_project(project("bob", "b")).await.unwrap();

        let mine = db.list_projects("alice").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "a");
    }

    #[tokio::test]
    async fn deleting_a_project_removes_its_tasks() {
        let db = MemoryDatabase::new();
        let p = db.insert_project(project("alice", "a")).await.unwrap();
        db.insert_task(Task::create(
            "alice",
            CreateTask {
                title: "t1".to_string(),
                description: None,
                project_id: Some(p.id.clone()),
                status: Stage::Todo,
                due_date: None,
            },
        ))
        .await
        .unwrap();
        db.insert_task(Task::create(
            "alice",
            CreateTask {
                title: "standalone".to_string(),
                description: None,
                project_id: None,
                status: Stage::Todo,
                due_date: None,
            },
        ))
        .await
        .unwrap();

        assert!(db.delete_project(&p.id).await.unwrap());
        let remaining = db.list_tasks("alice", None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "standalone");
    }

    #[tokio::test]
    async fn upsert_keeps_created_at() {
        let db = MemoryDatabase::new();
        let first = db
            .upsert_user(User {
                id: "u1".to_string(),
                name: Some("one".to_string()),
                email: None,
                image: None,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let second = db
            .upsert_user(User {
                id: "u1".to_string(),
                name: Some("two".to_string()),
                email: None,
                image: None,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.name.as_deref(), Some("two"));
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }
}
