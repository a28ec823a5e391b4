use garde::Validate;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::{
    crypto::field_cipher::{FieldCipher, Revealed},
    error::{AppError, Result},
    models::registration::{
        NationalIdView, NewRegistration, Registration, RegistrationStatus, RegistrationView,
    },
    repositories::registration as registration_repo,
    state::AppState,
    validation::registration::RegistrationForm,
};

/// Hides every digit of a national ID except the last four.
pub fn mask_national_id(national_id: &str) -> String {
    let count = national_id.chars().count();
    if count < 4 {
        return national_id.to_string();
    }

    national_id
        .chars()
        .enumerate()
        .map(|(i, c)| if i < count - 4 && c.is_ascii_digit() { 'X' } else { c })
        .collect()
}

/// Decrypts a stored national ID for display.
///
/// A record that fails to decrypt becomes [`NationalIdView::Undecryptable`]
/// instead of failing the caller.
pub fn view_national_id(cipher: &FieldCipher, id: &Uuid, stored: &str) -> NationalIdView {
    match cipher.reveal(stored) {
        Ok(Revealed::Verified(value)) => NationalIdView::Decrypted(value),
        Ok(Revealed::Legacy(value)) => NationalIdView::Legacy(value),
        Err(e) => {
            tracing::error!("❌ National ID of registration {} is undecryptable: {}", id, e);
            NationalIdView::Undecryptable
        }
    }
}

/// Converts a stored registration into its admin view.
pub fn to_view(cipher: &FieldCipher, registration: Registration) -> RegistrationView {
    let national_id = view_national_id(cipher, &registration.id, &registration.national_id);
    let national_id_masked = match &national_id {
        NationalIdView::Decrypted(value) | NationalIdView::Legacy(value) => {
            Some(mask_national_id(value))
        }
        NationalIdView::Undecryptable => None,
    };

    RegistrationView {
        id: registration.id,
        sequence: registration.sequence,
        prefix: registration.prefix,
        first_name_th: registration.first_name_th,
        last_name_th: registration.last_name_th,
        first_name_en: registration.first_name_en,
        last_name_en: registration.last_name_en,
        national_id,
        national_id_masked,
        email: registration.email,
        phone_number: registration.phone_number,
        faculty: registration.faculty,
        department: registration.department,
        academic_position: registration.academic_position,
        administrative_position: registration.administrative_position,
        role: registration.role,
        status: registration.status,
        created_at: registration.created_at,
        updated_at: registration.updated_at,
    }
}

/// Finds a stored record whose national ID equals `national_id`.
///
/// Legacy plaintext rows are compared on their value too, so they cannot
/// shadow an encrypted row for the same person. Rows that fail to decrypt
/// are skipped and logged. `exclude` skips the record being edited.
pub fn find_national_id_match(
    cipher: &FieldCipher,
    stored: &[(Uuid, String)],
    national_id: &str,
    exclude: Option<&Uuid>,
) -> Option<Uuid> {
    for (id, raw) in stored {
        if exclude == Some(id) {
            continue;
        }
        match cipher.reveal(raw) {
            Ok(revealed) if revealed.value() == national_id => {
                if revealed.is_legacy() {
                    tracing::warn!("⚠️  National ID matched legacy plaintext row {}", id);
                }
                return Some(*id);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("❌ Skipping undecryptable registration {} during uniqueness check: {}", id, e);
            }
        }
    }
    None
}

fn map_unique_violation(err: AppError) -> AppError {
    match err {
        AppError::Database(ref e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
            AppError::Conflict("Email is already registered".to_string())
        }
        other => other,
    }
}

/// Validates a form and turns it into storable values, encrypting the
/// national ID under a fresh IV.
pub fn prepare(cipher: &FieldCipher, form: RegistrationForm) -> Result<NewRegistration> {
    form.validate()?;

    let envelope = cipher.encrypt(&form.national_id)?;

    Ok(NewRegistration {
        prefix: form.prefix,
        first_name_th: form.first_name_th.trim().to_string(),
        last_name_th: form.last_name_th.trim().to_string(),
        first_name_en: form.first_name_en.trim().to_string(),
        last_name_en: form.last_name_en.trim().to_string(),
        national_id_envelope: envelope.into_string(),
        email: form.email.trim().to_string(),
        phone_number: form.phone_number,
        faculty: form.faculty.trim().to_string(),
        department: form.department.trim().to_string(),
        academic_position: form.academic_position,
        administrative_position: form
            .administrative_position
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        role: form.role.filter(|s| !s.trim().is_empty()),
    })
}

/// Rejects a national ID or email already used by a record other than
/// `exclude`.
async fn ensure_unique(
    state: &AppState,
    national_id: &str,
    email: &str,
    exclude: Option<&Uuid>,
) -> Result<()> {
    let stored = registration_repo::stored_national_ids(&state.db).await?;
    if find_national_id_match(&state.cipher, &stored, national_id, exclude).is_some() {
        return Err(AppError::Conflict(
            "National ID is already registered".to_string(),
        ));
    }

    if registration_repo::email_exists(&state.db, email.trim(), exclude).await? {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    Ok(())
}

async fn store(state: &AppState, form: RegistrationForm) -> Result<Registration> {
    form.validate()?;
    ensure_unique(state, &form.national_id, &form.email, None).await?;

    let new = prepare(&state.cipher, form)?;
    registration_repo::insert(&state.db, &new)
        .await
        .map_err(map_unique_violation)
}

/// Validates and stores a public registration.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `form` - The submitted form.
///
/// # Returns
///
/// A `Result` containing the stored `Registration`.
pub async fn submit(state: &AppState, form: RegistrationForm) -> Result<Registration> {
    let registration = store(state, form).await?;

    tracing::info!(
        "✅ Registration stored: {} (sequence {})",
        registration.id,
        registration.sequence
    );

    Ok(registration)
}

/// Adds a registration on behalf of an admin.
pub async fn create(
    state: &AppState,
    form: RegistrationForm,
    admin: &str,
) -> Result<RegistrationView> {
    let registration = store(state, form).await?;

    tracing::info!(
        "✅ {} added registration {} (sequence {})",
        admin,
        registration.id,
        registration.sequence
    );

    Ok(to_view(&state.cipher, registration))
}

/// Replaces a registration's details.
///
/// The national ID is encrypted again under a fresh IV, which also upgrades
/// legacy plaintext rows. Uniqueness ignores the record itself, so keeping
/// the same national ID or email is not a conflict. Sequence and status are
/// left as they are.
pub async fn update(
    state: &AppState,
    id: &Uuid,
    form: RegistrationForm,
) -> Result<RegistrationView> {
    form.validate()?;

    if registration_repo::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    ensure_unique(state, &form.national_id, &form.email, Some(id)).await?;

    let changes = prepare(&state.cipher, form)?;
    let registration = registration_repo::update(&state.db, id, &changes)
        .await
        .map_err(map_unique_violation)?
        .ok_or(AppError::NotFound)?;

    tracing::info!("✅ Registration updated: {}", id);
    Ok(to_view(&state.cipher, registration))
}

/// Lists every registration for the admin API.
pub async fn list(state: &AppState) -> Result<Vec<RegistrationView>> {
    let registrations = registration_repo::list(&state.db).await?;
    Ok(registrations
        .into_iter()
        .map(|r| to_view(&state.cipher, r))
        .collect())
}

/// Fetches one registration for the admin API.
pub async fn get(state: &AppState, id: &Uuid) -> Result<RegistrationView> {
    let registration = registration_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(to_view(&state.cipher, registration))
}

/// Changes a registration's status.
pub async fn set_status(
    state: &AppState,
    id: &Uuid,
    status: RegistrationStatus,
) -> Result<RegistrationView> {
    let registration = registration_repo::update_status(&state.db, id, status)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("✅ Registration {} set to {}", id, status.as_str());
    Ok(to_view(&state.cipher, registration))
}

/// Deletes a registration.
pub async fn delete(state: &AppState, id: &Uuid) -> Result<()> {
    if !registration_repo::delete(&state.db, id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("🗑️  Registration deleted: {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::field_cipher::FieldKey;
    use crate::models::registration::{AcademicPosition, Prefix};

    fn cipher() -> FieldCipher {
        FieldCipher::new(FieldKey::new([0u8; 32]))
    }

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask_national_id("1234567890123"), "XXXXXXXXX0123");
        assert_eq!(mask_national_id("1234"), "1234");
        assert_eq!(mask_national_id("123"), "123");
        assert_eq!(mask_national_id("1-23-45678"), "X-XX-X5678");
    }

    #[test]
    fn uniqueness_sees_through_randomized_envelopes() {
        let cipher = cipher();
        let existing = Uuid::new_v4();
        let stored = vec![
            (Uuid::new_v4(), cipher.encrypt("1111111111111").unwrap().into_string()),
            (existing, cipher.encrypt("1234567890123").unwrap().into_string()),
        ];

        assert_eq!(
            find_national_id_match(&cipher, &stored, "1234567890123", None),
            Some(existing)
        );
        assert_eq!(find_national_id_match(&cipher, &stored, "9999999999999", None), None);
    }

    #[test]
    fn uniqueness_matches_legacy_plaintext() {
        let cipher = cipher();
        let legacy = Uuid::new_v4();
        let stored = vec![(legacy, "1234567890123".to_string())];

        assert_eq!(
            find_national_id_match(&cipher, &stored, "1234567890123", None),
            Some(legacy)
        );
    }

    #[test]
    fn uniqueness_skips_broken_rows() {
        let cipher = cipher();
        let good = Uuid::new_v4();
        let stored = vec![
            (Uuid::new_v4(), "00:11:22".to_string()),
            (good, cipher.encrypt("1234567890123").unwrap().into_string()),
        ];

        assert_eq!(
            find_national_id_match(&cipher, &stored, "1234567890123", None),
            Some(good)
        );
    }

    #[test]
    fn uniqueness_ignores_the_record_being_edited() {
        let cipher = cipher();
        let edited = Uuid::new_v4();
        let other = Uuid::new_v4();
        let stored = vec![
            (edited, cipher.encrypt("1234567890123").unwrap().into_string()),
            (other, cipher.encrypt("1111111111111").unwrap().into_string()),
        ];

        assert_eq!(
            find_national_id_match(&cipher, &stored, "1234567890123", Some(&edited)),
            None
        );
        assert_eq!(
            find_national_id_match(&cipher, &stored, "1111111111111", Some(&edited)),
            Some(other)
        );
        assert_eq!(
            find_national_id_match(&cipher, &stored, "1234567890123", Some(&other)),
            Some(edited)
        );
    }

    fn form(national_id: &str) -> RegistrationForm {
        RegistrationForm {
            prefix: Prefix::Miss,
            first_name_th: " สมหญิง ".to_string(),
            last_name_th: "ใจดี".to_string(),
            first_name_en: "Somying".to_string(),
            last_name_en: "Jaidee".to_string(),
            national_id: national_id.to_string(),
            email: "somying@example.ac.th".to_string(),
            phone_number: "0812345678".to_string(),
            faculty: "Science".to_string(),
            department: "Computer Science".to_string(),
            academic_position: AcademicPosition::Lecturer,
            administrative_position: Some("   ".to_string()),
            role: None,
        }
    }

    #[test]
    fn prepare_encrypts_national_id_and_normalizes_fields() {
        let cipher = cipher();
        let new = prepare(&cipher, form("1234567890123")).unwrap();

        assert!(!new.national_id_envelope.contains("1234567890123"));
        assert_eq!(cipher.decrypt(&new.national_id_envelope).unwrap(), "1234567890123");
        assert_eq!(new.first_name_th, "สมหญิง");
        assert_eq!(new.email, "somying@example.ac.th");
        assert_eq!(new.administrative_position, None);
    }

    #[test]
    fn prepare_reencrypts_on_every_call() {
        let cipher = cipher();
        let first = prepare(&cipher, form("1234567890123")).unwrap();
        let second = prepare(&cipher, form("1234567890123")).unwrap();

        assert_ne!(first.national_id_envelope, second.national_id_envelope);
    }

    #[test]
    fn prepare_rejects_invalid_forms() {
        assert!(matches!(
            prepare(&cipher(), form("12345")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn view_isolates_undecryptable_records() {
        let cipher = cipher();
        let id = Uuid::new_v4();
        let envelope = cipher.encrypt("1234567890123").unwrap();

        assert_eq!(
            view_national_id(&cipher, &id, envelope.as_str()),
            NationalIdView::Decrypted("1234567890123".to_string())
        );
        assert_eq!(
            view_national_id(&cipher, &id, "1234567890123"),
            NationalIdView::Legacy("1234567890123".to_string())
        );
        assert_eq!(
            view_national_id(&cipher, &id, "deadbeef:00:11"),
            NationalIdView::Undecryptable
        );
    }
}
