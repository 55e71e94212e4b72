//! Class role queries.

use rusqlite::Connection;

use questline_types::profile::ClassRole;
use questline_types::ClassRoleId;

use crate::{not_found, Result};

/// Insert a class role.
pub fn insert(conn: &Connection, name: &str, description: &str) -> Result<ClassRole> {
    conn.execute(
        "INSERT INTO class_roles (name, description) VALUES (?1, ?2)",
        rusqlite::params![name, description],
    )?;
    Ok(ClassRole {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        description: description.to_string(),
    })
}

/// Get a class role by id.
pub fn get(conn: &Connection, id: ClassRoleId) -> Result<ClassRole> {
    conn.query_row(
        "SELECT id, name, description FROM class_roles WHERE id = ?1",
        [id],
        |row| {
            Ok(ClassRole {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        },
    )
    .map_err(not_found("class role"))
}

/// List all class roles.
pub fn list(conn: &Connection) -> Result<Vec<ClassRole>> {
    let mut stmt = conn.prepare("SELECT id, name, description FROM class_roles ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClassRole {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Remove a class role. Profiles referencing it fall back to none.
pub fn delete(conn: &Connection, id: ClassRoleId) -> Result<()> {
    conn.execute("DELETE FROM class_roles WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;

    #[test]
    fn test_insert_list_get() {
        let conn = crate::open_memory().expect("open");
        let warrior = insert(&conn, "Warrior", "Melee").expect("insert");
        insert(&conn, "Mage", "").expect("insert");
        let all = list(&conn).expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], warrior);
        assert_eq!(get(&conn, warrior.id).expect("get").name, "Warrior");
        assert!(matches!(get(&conn, 99), Err(DbError::NotFound(_))));
    }
}
