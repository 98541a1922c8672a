use std::collections::HashSet;
use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    EntityKind, NewProject, ProjectRole, ProjectService, ServiceError, SqliteProjectRepository,
    SqliteUserRepository, UserRepository,
};

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn create_user(conn: &rusqlite::Connection, email: &str) -> i64 {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    repo.create_user(email, "Someone", "opaque").unwrap().id
}

fn new_project(name: &str, owner_id: i64) -> NewProject {
    NewProject {
        name: name.to_string(),
        description: None,
        owner_id,
    }
}

#[test]
fn create_project_trims_name_and_keeps_description() {
    let conn = setup();
    let owner = create_user(&conn, "owner@example.com");
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());

    let project = service
        .create_project(&NewProject {
            description: Some("launch plan".to_string()),
            ..new_project("  Launch ", owner)
        })
        .unwrap();

    let loaded = service.get_project(project.id).unwrap();
    assert_eq!(loaded.name, "Launch");
    assert_eq!(loaded.description.as_deref(), Some("launch plan"));
    assert_eq!(loaded.owner_id, owner);
}

#[test]
fn create_project_requires_owner_and_name() {
    let conn = setup();
    let owner = create_user(&conn, "owner@example.com");
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.create_project(&new_project("p", 321)).unwrap_err(),
        ServiceError::NotFound(EntityKind::User, 321)
    ));
    assert!(matches!(
        service.create_project(&new_project("", owner)).unwrap_err(),
        ServiceError::Validation(_)
    ));
}

#[test]
fn get_projects_unions_owned_and_member_without_duplicates() {
    let conn = setup();
    let alice = create_user(&conn, "alice@example.com");
    let bob = create_user(&conn, "bob@example.com");
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());

    let owned = service.create_project(&new_project("own", alice)).unwrap();
    let joined = service.create_project(&new_project("joined", bob)).unwrap();
    let other = service.create_project(&new_project("other", bob)).unwrap();

    service
        .add_member(joined.id, alice, ProjectRole::Member)
        .unwrap();
    // Owner with an explicit owner-role membership row.
    service
        .add_member(owned.id, alice, ProjectRole::Owner)
        .unwrap();

    let visible = service.get_projects(alice).unwrap();
    let ids: Vec<i64> = visible.iter().map(|project| project.id).collect();
    assert_eq!(ids, vec![owned.id, joined.id]);

    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    assert!(!unique.contains(&other.id));

    let bob_ids: Vec<i64> = service
        .get_projects(bob)
        .unwrap()
        .iter()
        .map(|project| project.id)
        .collect();
    assert_eq!(bob_ids, vec![joined.id, other.id]);
}

#[test]
fn add_member_defaults_to_member_role() {
    let conn = setup();
    let owner = create_user(&conn, "owner@example.com");
    let guest = create_user(&conn, "guest@example.com");
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());
    let project = service.create_project(&new_project("p", owner)).unwrap();

    let member = service
        .add_member(project.id, guest, ProjectRole::default())
        .unwrap();
    assert_eq!(member.role, ProjectRole::Member);
    assert_eq!(member.project_id, project.id);
    assert_eq!(member.user_id, guest);

    let members = service.list_members(project.id).unwrap();
    assert_eq!(members, vec![member]);
}

#[test]
fn duplicate_membership_conflicts_regardless_of_role() {
    let conn = setup();
    let owner = create_user(&conn, "owner@example.com");
    let guest = create_user(&conn, "guest@example.com");
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());
    let project = service.create_project(&new_project("p", owner)).unwrap();

    service
        .add_member(project.id, guest, ProjectRole::Member)
        .unwrap();
    let err = service
        .add_member(project.id, guest, ProjectRole::Owner)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Conflict(EntityKind::ProjectMember)
    ));
    assert_eq!(err.code(), "conflict");

    let members = service.list_members(project.id).unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, ProjectRole::Member);
}

#[test]
fn add_member_requires_project_and_user() {
    let conn = setup();
    let owner = create_user(&conn, "owner@example.com");
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());
    let project = service.create_project(&new_project("p", owner)).unwrap();

    assert!(matches!(
        service
            .add_member(88, owner, ProjectRole::Member)
            .unwrap_err(),
        ServiceError::NotFound(EntityKind::Project, 88)
    ));
    assert!(matches!(
        service
            .add_member(project.id, 99, ProjectRole::Member)
            .unwrap_err(),
        ServiceError::NotFound(EntityKind::User, 99)
    ));
    assert!(matches!(
        service.list_members(88).unwrap_err(),
        ServiceError::NotFound(EntityKind::Project, 88)
    ));
}
