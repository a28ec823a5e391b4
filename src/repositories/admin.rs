use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;
use crate::{
    error::Result,
    models::admin::Admin,
};

/// A helper function to map a `tokio_postgres::Row` to an `Admin`.
fn row_to_admin(row: &Row) -> Result<Admin> {
    Ok(Admin {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        role: row.try_get("role")?,
        is_active: row.try_get("is_active")?,
        last_login: row.try_get("last_login")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const ADMIN_COLUMNS: &str =
    "id, username, name, email, password, role, is_active, last_login, created_at, updated_at";

/// Creates a new admin in the database.
pub async fn create_admin(
    pool: &Pool,
    username: &str,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<Admin> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                r#"
                INSERT INTO admins (id, username, name, email, password, role, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, true)
                RETURNING {ADMIN_COLUMNS}
                "#
            ),
            &[&Uuid::new_v4(), &username, &name, &email, &password_hash, &role],
        )
        .await?;
    row_to_admin(&row)
}

/// Finds an admin by username, active or not.
pub async fn find_by_username(pool: &Pool, username: &str) -> Result<Option<Admin>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE username = $1"),
            &[&username],
        )
        .await?;
    row.map(|r| row_to_admin(&r)).transpose()
}

/// Finds an admin by their ID.
pub async fn find_by_id(pool: &Pool, admin_id: &Uuid) -> Result<Option<Admin>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"),
            &[admin_id],
        )
        .await?;
    row.map(|r| row_to_admin(&r)).transpose()
}

/// Whether an admin with this username or email already exists.
pub async fn exists_by_username_or_email(pool: &Pool, username: &str, email: &str) -> Result<bool> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT 1 FROM admins WHERE username = $1 OR email = $2 LIMIT 1",
            &[&username, &email],
        )
        .await?;
    Ok(row.is_some())
}

/// Records a successful login.
pub async fn touch_last_login(pool: &Pool, admin_id: &Uuid) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            "UPDATE admins SET last_login = NOW(), updated_at = NOW() WHERE id = $1",
            &[admin_id],
        )
        .await?;
    Ok(())
}
