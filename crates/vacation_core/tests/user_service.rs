mod common;

use common::StepClock;
use vacation_core::db::open_db_in_memory;
use vacation_core::{
    BaseRepository, DbContext, EntityRepository, RepoError, User, UserService, UserServiceError,
};

#[test]
fn register_user_persists_and_returns_view() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);

    let view = service
        .register_user(" ana@example.com ", "Ana Silva")
        .unwrap();

    assert_eq!(view.email, "ana@example.com");
    assert_eq!(view.full_name, "Ana Silva");
    assert!(view.roles.is_empty());
    assert_eq!(service.get_user(view.id).unwrap(), Some(view));
}

#[test]
fn register_user_rejects_duplicate_email_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);
    service.register_user("ana@example.com", "Ana").unwrap();

    let err = service
        .register_user("ANA@example.com", "Other Ana")
        .unwrap_err();

    assert!(matches!(err, UserServiceError::EmailTaken(email) if email == "ana@example.com"));
    assert_eq!(service.list_users().unwrap().len(), 1);
}

#[test]
fn register_user_with_invalid_email_stores_nothing() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);

    let err = service.register_user("not-an-email", "Ana").unwrap_err();

    assert!(matches!(err, UserServiceError::Repo(RepoError::Validation(_))));
    assert!(!context.has_changes());
    assert!(service.list_users().unwrap().is_empty());
}

#[test]
fn assigned_roles_appear_in_view_sorted_by_name() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);
    let user = service.register_user("ana@example.com", "Ana").unwrap();
    let lead = service.create_role("Team Lead").unwrap();
    let employee = service.create_role("Employee").unwrap();

    service.assign_role(user.id, lead.id).unwrap();
    service.assign_role(user.id, employee.id).unwrap();
    service.assign_role(user.id, employee.id).unwrap();

    let view = service.get_user(user.id).unwrap().unwrap();
    assert_eq!(view.roles, vec![employee, lead]);
}

#[test]
fn assign_role_reports_unknown_user_or_role() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);
    let user = service.register_user("ana@example.com", "Ana").unwrap();
    let role = service.create_role("Employee").unwrap();
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(
        service.assign_role(missing, role.id),
        Err(UserServiceError::UserNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.assign_role(user.id, missing),
        Err(UserServiceError::RoleNotFound(id)) if id == missing
    ));
}

#[test]
fn revoke_role_removes_membership_and_tolerates_repeats() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);
    let user = service.register_user("ana@example.com", "Ana").unwrap();
    let role = service.create_role("Employee").unwrap();
    service.assign_role(user.id, role.id).unwrap();

    service.revoke_role(user.id, role.id).unwrap();
    service.revoke_role(user.id, role.id).unwrap();

    assert!(service.get_user(user.id).unwrap().unwrap().roles.is_empty());
}

#[test]
fn rename_user_refreshes_last_modified_only() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::with_clock(&conn, StepClock::new(1_000, 10));
    let service = UserService::new(&context);
    let user = service.register_user("ana@example.com", "Ana").unwrap();

    let renamed = service.rename_user(user.id, "Ana Souza").unwrap();
    assert_eq!(renamed.full_name, "Ana Souza");

    let fresh = DbContext::new(&conn);
    let stored = EntityRepository::<User>::new(&fresh)
        .find_by_id(&user.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.created_at, Some(1_000));
    assert!(stored.last_modified_at > stored.created_at);
}

#[test]
fn rename_unknown_user_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);

    assert!(matches!(
        service.rename_user(uuid::Uuid::new_v4(), "Nobody"),
        Err(UserServiceError::UserNotFound(_))
    ));
}

#[test]
fn delete_user_removes_memberships_and_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);
    let ana = service.register_user("ana@example.com", "Ana").unwrap();
    let bia = service.register_user("bia@example.com", "Bia").unwrap();
    let role = service.create_role("Employee").unwrap();
    service.assign_role(ana.id, role.id).unwrap();
    service.assign_role(bia.id, role.id).unwrap();

    service.delete_user(ana.id).unwrap();
    service.delete_user(ana.id).unwrap();

    assert!(service.get_user(ana.id).unwrap().is_none());
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM user_roles;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 1);
    assert_eq!(service.get_user(bia.id).unwrap().unwrap().roles.len(), 1);
}

#[test]
fn list_and_find_by_email() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);
    service.register_user("carla@example.com", "Carla").unwrap();
    service.register_user("ana@example.com", "Ana").unwrap();
    service.register_user("bia@example.com", "Bia").unwrap();

    let emails: Vec<String> = service
        .list_users()
        .unwrap()
        .into_iter()
        .map(|user| user.email)
        .collect();
    assert_eq!(
        emails,
        vec!["ana@example.com", "bia@example.com", "carla@example.com"]
    );

    let found = service.find_by_email("BIA@example.com").unwrap().unwrap();
    assert_eq!(found.full_name, "Bia");
    assert!(service.find_by_email("nobody@example.com").unwrap().is_none());
}

#[test]
fn service_sees_users_committed_by_another_context() {
    let conn = open_db_in_memory().unwrap();
    let writer = DbContext::new(&conn);
    let view = UserService::new(&writer)
        .register_user("ana@example.com", "Ana")
        .unwrap();

    let reader = DbContext::new(&conn);
    let found = UserService::new(&reader).get_user(view.id).unwrap();
    assert_eq!(found, Some(view));
}

#[test]
fn register_user_rejects_non_ascii_case_variant() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);
    let first = service
        .register_user("ÉLODIE@example.com", "Élodie Martin")
        .unwrap();
    assert_eq!(first.email, "élodie@example.com");

    let err = service
        .register_user("élodie@example.com", "Élodie Bis")
        .unwrap_err();

    assert!(matches!(err, UserServiceError::EmailTaken(email) if email == "élodie@example.com"));
    assert_eq!(
        service.find_by_email("Élodie@Example.com").unwrap().map(|user| user.id),
        Some(first.id)
    );
}

#[test]
fn register_user_sees_email_committed_by_another_context() {
    let conn = open_db_in_memory().unwrap();
    let writer = DbContext::new(&conn);
    UserService::new(&writer)
        .register_user("ana@example.com", "Ana")
        .unwrap();

    let other = DbContext::new(&conn);
    let err = UserService::new(&other)
        .register_user("Ana@Example.com", "Ana Again")
        .unwrap_err();

    assert!(matches!(err, UserServiceError::EmailTaken(_)));
}

#[test]
fn get_user_includes_only_that_users_roles() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let service = UserService::new(&context);
    let ana = service.register_user("ana@example.com", "Ana").unwrap();
    let bia = service.register_user("bia@example.com", "Bia").unwrap();
    let employee = service.create_role("Employee").unwrap();
    let admin = service.create_role("Admin").unwrap();
    service.assign_role(ana.id, employee.id).unwrap();
    service.assign_role(bia.id, admin.id).unwrap();

    let view = service.get_user(bia.id).unwrap().unwrap();

    assert_eq!(view.roles, vec![admin]);
    assert!(service.get_user(uuid::Uuid::new_v4()).unwrap().is_none());
}
