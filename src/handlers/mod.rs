//! Route handlers. Every handler runs its guard first and returns the
//! guard's prepared response on failure.

pub mod health;
pub mod kanban;
pub mod projects;
pub mod public;
pub mod tasks;
pub mod upload;
pub mod users;
