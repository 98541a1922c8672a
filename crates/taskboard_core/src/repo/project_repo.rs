//! Project and membership repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Visible set is `owned ∪ member-of`, each project at most once.
//! - Project listing is deterministic: `id ASC`.
//! - A duplicate `(project_id, user_id)` membership is a `Conflict`, decided
//!   by the storage `UNIQUE` constraint rather than a prior read.

use super::{conflict_on_unique, ensure_connection_ready, user_exists, RepoError, RepoResult};
use crate::model::project::{Project, ProjectId, ProjectMember, ProjectRole};
use crate::model::user::UserId;
use crate::model::EntityKind;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    p.id AS id,
    p.name AS name,
    p.description AS description,
    p.owner_id AS owner_id,
    p.created_at AS created_at,
    p.updated_at AS updated_at
FROM projects p";

const MEMBER_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    user_id,
    role,
    created_at
FROM project_members";

/// Repository interface for projects and membership grants.
pub trait ProjectRepository {
    /// Inserts one project. The name must already be normalized.
    fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: UserId,
    ) -> RepoResult<Project>;
    /// Loads one project by id.
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists projects owned by `user_id` or where it holds a membership row.
    fn list_visible_projects(&self, user_id: UserId) -> RepoResult<Vec<Project>>;
    /// Inserts one membership row.
    fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: ProjectRole,
    ) -> RepoResult<ProjectMember>;
    /// Lists membership rows of one project.
    fn list_members(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectMember>>;
    /// Returns whether the user row exists.
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: UserId,
    ) -> RepoResult<Project> {
        self.conn.execute(
            "INSERT INTO projects (name, description, owner_id) VALUES (?1, ?2, ?3);",
            params![name, description, owner_id],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_project(id)?
            .ok_or(RepoError::NotFound(EntityKind::Project, id))
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE p.id = ?1;"),
                [id],
                parse_project_row,
            )
            .optional()?;
        Ok(project)
    }

    fn list_visible_projects(&self, user_id: UserId) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE p.owner_id = ?1
                OR EXISTS(
                    SELECT 1
                    FROM project_members m
                    WHERE m.project_id = p.id
                      AND m.user_id = ?1
                )
             ORDER BY p.id ASC;"
        ))?;
        let projects = stmt
            .query_map([user_id], parse_project_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: ProjectRole,
    ) -> RepoResult<ProjectMember> {
        self.conn
            .execute(
                "INSERT INTO project_members (project_id, user_id, role) VALUES (?1, ?2, ?3);",
                params![project_id, user_id, project_role_to_db(role)],
            )
            .map_err(|err| conflict_on_unique(err, EntityKind::ProjectMember))?;
        let id = self.conn.last_insert_rowid();

        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_member_row(row);
        }
        Err(RepoError::NotFound(EntityKind::ProjectMember, id))
    }

    fn list_members(&self, project_id: ProjectId) -> RepoResult<Vec<ProjectMember>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBER_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        user_exists(self.conn, user_id)
    }
}

fn parse_project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        owner_id: row.get("owner_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<ProjectMember> {
    let role_text: String = row.get("role")?;
    let role = parse_project_role(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid project role `{role_text}` in project_members.role"
        ))
    })?;

    Ok(ProjectMember {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        user_id: row.get("user_id")?,
        role,
        created_at: row.get("created_at")?,
    })
}

fn project_role_to_db(role: ProjectRole) -> &'static str {
    match role {
        ProjectRole::Owner => "owner",
        ProjectRole::Member => "member",
    }
}

fn parse_project_role(value: &str) -> Option<ProjectRole> {
    match value {
        "owner" => Some(ProjectRole::Owner),
        "member" => Some(ProjectRole::Member),
        _ => None,
    }
}
