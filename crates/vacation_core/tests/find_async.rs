use vacation_core::db::open_db_in_memory;
use vacation_core::{BaseRepository, DbContext, EntityRepository, Role};

#[tokio::test]
async fn find_by_id_async_matches_sync_lookup() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let roles = EntityRepository::<Role>::new(&context);
    let mut role = Role::new("Employee");
    roles.add(&mut role).unwrap();
    context.save_changes().unwrap();

    let fresh = DbContext::new(&conn);
    let fresh_roles = EntityRepository::<Role>::new(&fresh);
    let found = fresh_roles.find_by_id_async(&role.id).await.unwrap();

    assert_eq!(found, Some(role.clone()));
    assert_eq!(found, fresh_roles.find_by_id(&role.id).unwrap());
}

#[tokio::test]
async fn find_by_id_async_returns_none_for_missing_or_pending_delete() {
    let conn = open_db_in_memory().unwrap();
    let context = DbContext::new(&conn);
    let roles = EntityRepository::<Role>::new(&context);

    assert!(roles
        .find_by_id_async(&uuid::Uuid::new_v4())
        .await
        .unwrap()
        .is_none());

    let mut role = Role::new("Employee");
    roles.add(&mut role).unwrap();
    context.save_changes().unwrap();
    roles.remove(&role).unwrap();

    assert!(roles.find_by_id_async(&role.id).await.unwrap().is_none());
}
