use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "Nom")]
    pub name: String,
    pub icon: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "Nom")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub deleted: u64,
}

fn check_email(email: &str) -> Result<(), AppError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!("invalid email address: {email}"))),
    }
}

fn check_not_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_email(&self.email)?;
        check_not_blank("password", &self.password)?;
        check_not_blank("name", &self.name)
    }
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(password) = &self.password {
            check_not_blank("password", password)?;
        }
        if let Some(name) = &self.name {
            check_not_blank("name", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validation() {
        let mut req = RegisterRequest {
            email: "john@doe.fr".to_string(),
            password: "password123".to_string(),
            name: "John Doe".to_string(),
            icon: Some(1),
        };
        assert!(req.validate().is_ok());

        req.email = "john.doe.fr".to_string();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        req.email = "john@doe.fr".to_string();
        req.name = "  ".to_string();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn accepts_legacy_name_field() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.c","password":"pw","Nom":"Legacy"}"#,
        )
        .unwrap();
        assert_eq!(req.name, "Legacy");
        assert_eq!(req.icon, None);
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(UpdateUserRequest::default().validate().is_ok());
    }
}
