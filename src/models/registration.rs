use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Name prefixes offered on the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prefix {
    #[serde(rename = "นาย")]
    Mr,
    #[serde(rename = "นาง")]
    Mrs,
    #[serde(rename = "นางสาว")]
    Miss,
}

impl Prefix {
    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Mr => "นาย",
            Prefix::Mrs => "นาง",
            Prefix::Miss => "นางสาว",
        }
    }
}

/// Academic positions offered on the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcademicPosition {
    #[serde(rename = "อาจารย์")]
    Lecturer,
    #[serde(rename = "ผู้ช่วยศาสตราจารย์")]
    AssistantProfessor,
    #[serde(rename = "รองศาสตราจารย์")]
    AssociateProfessor,
    #[serde(rename = "ศาสตราจารย์")]
    Professor,
}

impl AcademicPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            AcademicPosition::Lecturer => "อาจารย์",
            AcademicPosition::AssistantProfessor => "ผู้ช่วยศาสตราจารย์",
            AcademicPosition::AssociateProfessor => "รองศาสตราจารย์",
            AcademicPosition::Professor => "ศาสตราจารย์",
        }
    }
}

/// Whether a registrant's access is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Active,
    Inactive,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Active => "active",
            RegistrationStatus::Inactive => "inactive",
        }
    }
}

/// A registration row as stored. `national_id` holds an encrypted envelope
/// (or, for rows written before encryption, the plaintext).
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: Uuid,
    pub sequence: i32,
    pub prefix: String,
    pub first_name_th: String,
    pub last_name_th: String,
    pub first_name_en: String,
    pub last_name_en: String,
    pub national_id: String,
    pub email: String,
    pub phone_number: String,
    pub faculty: String,
    pub department: String,
    pub academic_position: String,
    pub administrative_position: Option<String>,
    pub role: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Registration {
    type Error = AppError;

    fn try_from(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            sequence: row.try_get("sequence")?,
            prefix: row.try_get("prefix")?,
            first_name_th: row.try_get("first_name_th")?,
            last_name_th: row.try_get("last_name_th")?,
            first_name_en: row.try_get("first_name_en")?,
            last_name_en: row.try_get("last_name_en")?,
            national_id: row.try_get("national_id")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            faculty: row.try_get("faculty")?,
            department: row.try_get("department")?,
            academic_position: row.try_get("academic_position")?,
            administrative_position: row.try_get("administrative_position")?,
            role: row.try_get("role")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// The values written for a new registration, national ID already encrypted.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub prefix: Prefix,
    pub first_name_th: String,
    pub last_name_th: String,
    pub first_name_en: String,
    pub last_name_en: String,
    pub national_id_envelope: String,
    pub email: String,
    pub phone_number: String,
    pub faculty: String,
    pub department: String,
    pub academic_position: AcademicPosition,
    pub administrative_position: Option<String>,
    pub role: Option<String>,
}

/// The national ID as shown to an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum NationalIdView {
    /// Decrypted and authenticated.
    Decrypted(String),
    /// Pre-encryption row, shown as stored.
    Legacy(String),
    /// The stored envelope did not decrypt.
    Undecryptable,
}

/// A registration prepared for the admin API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationView {
    pub id: Uuid,
    pub sequence: i32,
    pub prefix: String,
    pub first_name_th: String,
    pub last_name_th: String,
    pub first_name_en: String,
    pub last_name_en: String,
    pub national_id: NationalIdView,
    pub national_id_masked: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub faculty: String,
    pub department: String,
    pub academic_position: String,
    pub administrative_position: Option<String>,
    pub role: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
