use types::{ApiError, ConstraintViolation, ValidationError};
use super::models::User;
use diesel::PgConnection;
use diesel::result::Error as DieselError;
use regex::Regex;

// Field bounds from the relational schema.
pub const LEN_NAME: usize = 150;
pub const LEN_EMAIL: usize = 254;
pub const LEN_PASSWORD: usize = 150;

const MIN_USERNAME: usize = 3;
const MIN_PASSWORD: usize = 5;

lazy_static! {
    static ref EMAIL_RE: Regex = {
        let pattern = r"(?i)\A[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\z";
        Regex::new(pattern).unwrap()
    };
    static ref USERNAME_RE: Regex = Regex::new(r"\A[\w.@+-]+\z").unwrap();
}

pub fn validate_email_re(email: &str) -> Result<(), ValidationError> {
    if email.len() > LEN_EMAIL {
        Err(ValidationError::from(
            "email",
            format!("email longer than {} characters", LEN_EMAIL),
        ))
    } else if !EMAIL_RE.is_match(email) {
        Err(ValidationError::from(
            "email",
            format!("invalid email: {}", email),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_username_re(username: &str) -> Result<(), ValidationError> {
    if username.len() < MIN_USERNAME {
        Err(ValidationError::from(
            "username",
            format!("username too short: {}", username),
        ))
    } else if username.len() > LEN_NAME {
        Err(ValidationError::from(
            "username",
            format!("username longer than {} characters", LEN_NAME),
        ))
    } else if !USERNAME_RE.is_match(username) {
        Err(ValidationError::from(
            "username",
            format!("invalid username: {}", username),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_name(field: &str, name: &str) -> Result<(), ValidationError> {
    if name.len() > LEN_NAME {
        Err(ValidationError::from(
            field,
            format!("{} longer than {} characters", field, LEN_NAME),
        ))
    } else {
        Ok(())
    }
}

/// A taken row fails the same way the storage constraint would, so callers
/// see one taxonomy whether the pre-check or the database catches it.
pub fn validate_unique(taken: bool, violation: ConstraintViolation) -> Result<(), ApiError> {
    if taken {
        Err(violation.into())
    } else {
        Ok(())
    }
}

fn lookup_exists(result: Result<User, ApiError>) -> Result<bool, ApiError> {
    match result {
        Ok(_) => Ok(true),
        Err(ApiError::Diesel(DieselError::NotFound)) => Ok(false),
        Err(other) => Err(other),
    }
}

/// Format plus uniqueness; run inside the same transaction as the write
/// that depends on it.
pub fn validate_email(email_to_validate: &str, connection: &PgConnection) -> Result<(), ApiError> {
    validate_email_re(email_to_validate)?;
    let taken = lookup_exists(User::load_by_email(email_to_validate, connection))?;
    validate_unique(taken, ConstraintViolation::UniqueEmail)
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD {
        Err(ValidationError::from("password", "password too short"))
    } else if password.len() > LEN_PASSWORD {
        Err(ValidationError::from(
            "password",
            format!("password longer than {} characters", LEN_PASSWORD),
        ))
    } else {
        Ok(())
    }
}
