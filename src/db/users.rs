//! User profile rows

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::conflict_on_unique;
use crate::access::UserId;
use crate::error::Result;
use crate::models::User;

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get("id")?),
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
    })
}

/// Insert a user; a taken username is a `Conflict`
pub fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, first_name, last_name, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.as_str(),
            user.username,
            user.email,
            user.first_name,
            user.last_name,
            user.is_active,
            user.created_at,
        ],
    )
    .map_err(|e| conflict_on_unique(e, || format!("username '{}' is taken", user.username)))?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &UserId) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            "SELECT * FROM users WHERE id = ?",
            params![id.as_str()],
            user_from_row,
        )
        .optional()?)
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            "SELECT * FROM users WHERE username = ?",
            params![username],
            user_from_row,
        )
        .optional()?)
}

/// Users ordered by username
pub fn list_users(conn: &Connection, limit: u32, offset: u32) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT * FROM users ORDER BY username LIMIT ?1 OFFSET ?2")?;
    let users = stmt
        .query_map(params![limit, offset], user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::HammerDb;
    use crate::error::HammerspaceError;
    use chrono::Utc;

    fn user(username: &str) -> User {
        User {
            id: UserId::generate(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let db = HammerDb::open_in_memory().unwrap();
        let alice = user("alice");
        db.with_conn(|conn| {
            insert_user(conn, &alice)?;
            let loaded = get_user(conn, &alice.id)?.unwrap();
            assert_eq!(loaded.username, "alice");
            assert_eq!(loaded.email, "alice@example.com");
            assert!(loaded.is_active);
            assert_eq!(
                get_user_by_username(conn, "alice")?.map(|u| u.id),
                Some(alice.id.clone())
            );
            assert!(get_user_by_username(conn, "nobody")?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let db = HammerDb::open_in_memory().unwrap();
        let result = db.with_conn(|conn| {
            insert_user(conn, &user("alice"))?;
            insert_user(conn, &user("alice"))
        });
        assert!(matches!(result, Err(HammerspaceError::Conflict(_))));
    }

    #[test]
    fn test_list_is_sorted() {
        let db = HammerDb::open_in_memory().unwrap();
        let names = db
            .with_conn(|conn| {
                insert_user(conn, &user("carol"))?;
                insert_user(conn, &user("alice"))?;
                insert_user(conn, &user("bob"))?;
                list_users(conn, 10, 0)
            })
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }
}
