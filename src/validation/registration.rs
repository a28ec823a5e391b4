use garde::Validate;
use serde::Deserialize;

use crate::models::registration::{AcademicPosition, Prefix};

/// The public registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[garde(skip)]
    pub prefix: Prefix,
    #[garde(custom(not_blank))]
    pub first_name_th: String,
    #[garde(custom(not_blank))]
    pub last_name_th: String,
    #[garde(custom(not_blank))]
    pub first_name_en: String,
    #[garde(custom(not_blank))]
    pub last_name_en: String,
    #[garde(length(min = 13, max = 13), custom(all_digits))]
    pub national_id: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 9, max = 10), custom(all_digits))]
    pub phone_number: String,
    #[garde(custom(not_blank))]
    pub faculty: String,
    #[garde(custom(not_blank))]
    pub department: String,
    #[garde(skip)]
    pub academic_position: AcademicPosition,
    #[garde(skip)]
    pub administrative_position: Option<String>,
    #[garde(skip)]
    pub role: Option<String>,
}

fn not_blank(value: &str, _: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be empty"));
    }
    Ok(())
}

fn all_digits(value: &str, _: &()) -> garde::Result {
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(garde::Error::new("must contain digits only"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        sonic_rs::from_str(
            r#"{
                "prefix": "นาย",
                "firstNameTh": "สมชาย",
                "lastNameTh": "ใจดี",
                "firstNameEn": "Somchai",
                "lastNameEn": "Jaidee",
                "nationalId": "1234567890123",
                "email": "somchai@example.ac.th",
                "phoneNumber": "0812345678",
                "faculty": "คณะนิติศาสตร์",
                "department": "นิติศาสตร์",
                "academicPosition": "อาจารย์"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn valid_form_passes() {
        let form = form();
        assert!(form.validate().is_ok());
        assert_eq!(form.prefix, Prefix::Mr);
        assert_eq!(form.academic_position, AcademicPosition::Lecturer);
        assert!(form.administrative_position.is_none());
    }

    #[test]
    fn national_id_must_be_thirteen_digits() {
        let mut short = form();
        short.national_id = "123".to_string();
        assert!(short.validate().is_err());

        let mut letters = form();
        letters.national_id = "12345678901ab".to_string();
        assert!(letters.validate().is_err());
    }

    #[test]
    fn phone_and_email_are_checked() {
        let mut phone = form();
        phone.phone_number = "08-1234567".to_string();
        assert!(phone.validate().is_err());

        let mut email = form();
        email.email = "not-an-email".to_string();
        assert!(email.validate().is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut blank = form();
        blank.first_name_th = "   ".to_string();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn unknown_prefix_does_not_deserialize() {
        let result: Result<RegistrationForm, _> = sonic_rs::from_str(
            r#"{"prefix":"Dr","firstNameTh":"a","lastNameTh":"b","firstNameEn":"c",
                "lastNameEn":"d","nationalId":"1234567890123","email":"a@b.co",
                "phoneNumber":"0812345678","faculty":"f","department":"d",
                "academicPosition":"อาจารย์"}"#,
        );
        assert!(result.is_err());
    }
}
