//! SQL text generated from `Entity` table mappings.

use crate::model::entity::Entity;
use rusqlite::types::Value;

pub(crate) fn select_all<T: Entity>() -> String {
    format!(
        "SELECT {} FROM {} ORDER BY rowid ASC;",
        T::COLUMNS.join(", "),
        T::TABLE
    )
}

pub(crate) fn select_by_key<T: Entity>() -> String {
    format!(
        "SELECT {} FROM {} WHERE {};",
        T::COLUMNS.join(", "),
        T::TABLE,
        key_predicate(T::KEY_COLUMNS, 1)
    )
}

pub(crate) fn insert<T: Entity>() -> String {
    let placeholders = (1..=T::COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders});",
        T::TABLE,
        T::COLUMNS.join(", ")
    )
}

/// Returns `None` when every column belongs to the key.
pub(crate) fn update<T: Entity>() -> Option<String> {
    let data_columns = data_columns::<T>();
    if data_columns.is_empty() {
        return None;
    }

    let assignments = data_columns
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "UPDATE {} SET {assignments} WHERE {};",
        T::TABLE,
        key_predicate(T::KEY_COLUMNS, data_columns.len() + 1)
    ))
}

pub(crate) fn delete<T: Entity>() -> String {
    format!(
        "DELETE FROM {} WHERE {};",
        T::TABLE,
        key_predicate(T::KEY_COLUMNS, 1)
    )
}

/// Bind values for `update::<T>()`: data columns, then key columns.
pub(crate) fn update_values<T: Entity>(entity: &T) -> Vec<Value> {
    let mut values: Vec<Value> = T::COLUMNS
        .iter()
        .zip(entity.column_values())
        .filter(|(column, _)| !T::KEY_COLUMNS.contains(*column))
        .map(|(_, value)| value)
        .collect();
    values.extend(T::key_values(&entity.key()));
    values
}

fn data_columns<T: Entity>() -> Vec<&'static str> {
    T::COLUMNS
        .iter()
        .copied()
        .filter(|column| !T::KEY_COLUMNS.contains(column))
        .collect()
}

fn key_predicate(key_columns: &[&str], first_index: usize) -> String {
    key_columns
        .iter()
        .enumerate()
        .map(|(offset, column)| format!("{column} = ?{}", first_index + offset))
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::{delete, insert, select_by_key, update, update_values};
    use crate::model::entity::Entity;
    use crate::model::role::UserRole;
    use crate::model::user::User;
    use rusqlite::types::Value;
    use uuid::Uuid;

    #[test]
    fn builds_single_key_statements() {
        assert_eq!(
            insert::<User>(),
            "INSERT INTO users (id, email, full_name, created_at, last_modified_at) \
             VALUES (?1, ?2, ?3, ?4, ?5);"
        );
        assert_eq!(
            update::<User>().unwrap(),
            "UPDATE users SET email = ?1, full_name = ?2, created_at = ?3, \
             last_modified_at = ?4 WHERE id = ?5;"
        );
        assert_eq!(delete::<User>(), "DELETE FROM users WHERE id = ?1;");
    }

    #[test]
    fn builds_composite_key_statements() {
        assert_eq!(
            select_by_key::<UserRole>(),
            "SELECT user_id, role_id, created_at FROM user_roles \
             WHERE user_id = ?1 AND role_id = ?2;"
        );
        assert_eq!(
            update::<UserRole>().unwrap(),
            "UPDATE user_roles SET created_at = ?1 WHERE user_id = ?2 AND role_id = ?3;"
        );
    }

    #[test]
    fn update_values_put_key_last() {
        let id = Uuid::new_v4();
        let mut user = User::with_id(id, "a@x.com", "A");
        user.created_at = Some(5);
        let values = update_values(&user);
        assert_eq!(values.len(), User::COLUMNS.len());
        assert_eq!(values[0], Value::Text("a@x.com".to_string()));
        assert_eq!(values[2], Value::Integer(5));
        assert_eq!(values[3], Value::Null);
        assert_eq!(values[4], Value::Text(id.to_string()));
    }
}
