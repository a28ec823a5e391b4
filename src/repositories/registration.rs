use deadpool_postgres::Pool;
use uuid::Uuid;
use crate::{
    error::Result,
    models::registration::{NewRegistration, Registration, RegistrationStatus},
};

const REGISTRATION_COLUMNS: &str = "id, sequence, prefix, first_name_th, last_name_th, \
    first_name_en, last_name_en, national_id, email, phone_number, faculty, department, \
    academic_position, administrative_position, role, status, created_at, updated_at";

/// Inserts a registration, assigning the next sequence number.
///
/// # Arguments
///
/// * `pool` - The database connection pool.
/// * `new` - The registration values; the national ID is already encrypted.
///
/// # Returns
///
/// A `Result` containing the stored `Registration`.
pub async fn insert(pool: &Pool, new: &NewRegistration) -> Result<Registration> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            &format!(
                r#"
                INSERT INTO registrations (
                    id, sequence, prefix, first_name_th, last_name_th, first_name_en,
                    last_name_en, national_id, email, phone_number, faculty, department,
                    academic_position, administrative_position, role, status
                )
                VALUES (
                    $1, (SELECT COALESCE(MAX(sequence), 0) + 1 FROM registrations),
                    $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 'active'
                )
                RETURNING {REGISTRATION_COLUMNS}
                "#
            ),
            &[
                &Uuid::new_v4(),
                &new.prefix.as_str(),
                &new.first_name_th,
                &new.last_name_th,
                &new.first_name_en,
                &new.last_name_en,
                &new.national_id_envelope,
                &new.email,
                &new.phone_number,
                &new.faculty,
                &new.department,
                &new.academic_position.as_str(),
                &new.administrative_position,
                &new.role,
            ],
        )
        .await?;
    Registration::try_from(&row)
}

/// Replaces a registration's details, keeping its sequence and status.
///
/// Returns `None` when no registration has this ID.
pub async fn update(
    pool: &Pool,
    id: &Uuid,
    changes: &NewRegistration,
) -> Result<Option<Registration>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                r#"
                UPDATE registrations SET
                    prefix = $2, first_name_th = $3, last_name_th = $4, first_name_en = $5,
                    last_name_en = $6, national_id = $7, email = $8, phone_number = $9,
                    faculty = $10, department = $11, academic_position = $12,
                    administrative_position = $13, role = $14, updated_at = NOW()
                WHERE id = $1
                RETURNING {REGISTRATION_COLUMNS}
                "#
            ),
            &[
                id,
                &changes.prefix.as_str(),
                &changes.first_name_th,
                &changes.last_name_th,
                &changes.first_name_en,
                &changes.last_name_en,
                &changes.national_id_envelope,
                &changes.email,
                &changes.phone_number,
                &changes.faculty,
                &changes.department,
                &changes.academic_position.as_str(),
                &changes.administrative_position,
                &changes.role,
            ],
        )
        .await?;
    row.map(|r| Registration::try_from(&r)).transpose()
}

/// Lists all registrations, newest first.
pub async fn list(pool: &Pool) -> Result<Vec<Registration>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            &format!("SELECT {REGISTRATION_COLUMNS} FROM registrations ORDER BY created_at DESC"),
            &[],
        )
        .await?;
    rows.iter().map(Registration::try_from).collect()
}

/// Finds a registration by its ID.
pub async fn find_by_id(pool: &Pool, id: &Uuid) -> Result<Option<Registration>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"),
            &[id],
        )
        .await?;
    row.map(|r| Registration::try_from(&r)).transpose()
}

/// Whether another registration already uses this email.
pub async fn email_exists(pool: &Pool, email: &str, exclude: Option<&Uuid>) -> Result<bool> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT 1 FROM registrations WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2) LIMIT 1",
            &[&email, &exclude],
        )
        .await?;
    Ok(row.is_some())
}

/// Returns `(id, stored national ID)` for every registration.
///
/// Envelopes are randomized, so equality checks have to decrypt each value.
pub async fn stored_national_ids(pool: &Pool) -> Result<Vec<(Uuid, String)>> {
    let client = pool.get().await?;
    let rows = client
        .query("SELECT id, national_id FROM registrations", &[])
        .await?;
    rows.iter()
        .map(|row| -> Result<(Uuid, String)> {
            Ok((row.try_get("id")?, row.try_get("national_id")?))
        })
        .collect()
}

/// Updates a registration's status.
pub async fn update_status(
    pool: &Pool,
    id: &Uuid,
    status: RegistrationStatus,
) -> Result<Option<Registration>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            &format!(
                "UPDATE registrations SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {REGISTRATION_COLUMNS}"
            ),
            &[&status.as_str(), id],
        )
        .await?;
    row.map(|r| Registration::try_from(&r)).transpose()
}

/// Deletes a registration. Returns whether a row was removed.
pub async fn delete(pool: &Pool, id: &Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let affected = client
        .execute("DELETE FROM registrations WHERE id = $1", &[id])
        .await?;
    Ok(affected > 0)
}
