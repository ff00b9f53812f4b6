use std::collections::HashMap;
use std::fmt;
use std::io::Error as IoError;
use diesel::result::Error as DieselError;
use diesel::PgConnection;
use serde_json::Value;

pub trait Validate
where
    Self: Sized,
{
    type Error;
    fn validate(self, connection: &PgConnection) -> Result<Self, Self::Error>;
}

pub type ApiResult<T> = Result<T, ApiError>;

/// A write was rejected by one of the constraints declared in the
/// migrations. Each variant knows its constraint name, so database errors
/// can be mapped back to the violation they stand for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintViolation {
    UniqueEmail,
    UniqueUsername,
    UniqFollow,
    SelfFollowing,
}

impl ConstraintViolation {
    pub fn constraint(&self) -> &'static str {
        match *self {
            ConstraintViolation::UniqueEmail => "uniq_user_email",
            ConstraintViolation::UniqueUsername => "uniq_user_username",
            ConstraintViolation::UniqFollow => "uniq_follow",
            ConstraintViolation::SelfFollowing => "self_following",
        }
    }

    pub fn message(&self) -> &'static str {
        match *self {
            ConstraintViolation::UniqueEmail => "user with this email already exists",
            ConstraintViolation::UniqueUsername => "user with this username already exists",
            ConstraintViolation::UniqFollow => "already following this author",
            ConstraintViolation::SelfFollowing => "following yourself is not allowed",
        }
    }

    fn from_constraint(name: &str) -> Option<ConstraintViolation> {
        match name {
            "uniq_user_email" => Some(ConstraintViolation::UniqueEmail),
            "uniq_user_username" => Some(ConstraintViolation::UniqueUsername),
            "uniq_follow" => Some(ConstraintViolation::UniqFollow),
            "self_following" => Some(ConstraintViolation::SelfFollowing),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Diesel(DieselError),
    Validation(ValidationError),
    Constraint(ConstraintViolation),
    PermissionDenied,
    Internal,
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        match err {
            DieselError::DatabaseError(kind, info) => {
                let violation = info.constraint_name()
                    .and_then(ConstraintViolation::from_constraint);
                match violation {
                    Some(violation) => ApiError::Constraint(violation),
                    None => ApiError::Diesel(DieselError::DatabaseError(kind, info)),
                }
            }
            other => ApiError::Diesel(other),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> ApiError {
        ApiError::Validation(err)
    }
}

impl From<ConstraintViolation> for ApiError {
    fn from(violation: ConstraintViolation) -> ApiError {
        ApiError::Constraint(violation)
    }
}

impl From<IoError> for ApiError {
    fn from(_: IoError) -> ApiError {
        ApiError::Internal
    }
}

impl ApiError {
    /// The user-facing body the routing layer serializes into a response.
    pub fn errors_json(&self) -> Value {
        match *self {
            ApiError::Validation(ref error) => json!({ "errors": error }),
            ApiError::Constraint(violation) => {
                let error = ValidationError::from(violation.constraint(), violation.message());
                json!({ "errors": error })
            }
            ApiError::PermissionDenied => json!({
                "errors": { "detail": ["you do not have permission to perform this action"] }
            }),
            _ => json!({ "errors": { "detail": ["internal server error"] } }),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ApiError::Diesel(ref error) => write!(f, "{}", error),
            ApiError::Validation(ref error) => write!(f, "{}", error),
            ApiError::Constraint(violation) => f.write_str(violation.message()),
            ApiError::PermissionDenied => {
                f.write_str("you do not have permission to perform this action")
            }
            ApiError::Internal => f.write_str("internal server error"),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct ValidationError(HashMap<String, Vec<String>>);

impl ValidationError {
    pub fn add_error<K: Into<String>, V: Into<String>>(&mut self, key: K, val: V) {
        let entry = self.0.entry(key.into()).or_insert(Vec::default());
        entry.push(val.into());
    }

    pub fn from<K: Into<String>, V: Into<String>>(key: K, val: V) -> Self {
        let mut error = ValidationError::default();
        error.add_error(key, val);
        error
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: ValidationError) {
        for (key, errors) in other.0.into_iter() {
            let entry = self.0.entry(key).or_insert(Vec::default());
            entry.extend(errors);
        }
    }

    pub fn empty(&self) -> bool {
        self.len() == 0
    }

    pub fn messages(&self, key: &str) -> Option<&Vec<String>> {
        self.0.get(key)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (key, errors) in &self.0 {
            for error in errors {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", key, error)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};

    struct Constraint(&'static str);

    impl DatabaseErrorInformation for Constraint {
        fn message(&self) -> &str {
            "constraint violated"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
    }

    fn database_error(kind: DatabaseErrorKind, constraint: &'static str) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Constraint(constraint)))
    }

    #[test]
    fn declared_constraints_map_to_violations() {
        let err = ApiError::from(database_error(
            DatabaseErrorKind::UniqueViolation,
            "uniq_follow",
        ));
        match err {
            ApiError::Constraint(ConstraintViolation::UniqFollow) => {}
            other => panic!("unexpected mapping: {:?}", other),
        }

        let err = ApiError::from(database_error(
            DatabaseErrorKind::__Unknown,
            "self_following",
        ));
        match err {
            ApiError::Constraint(ConstraintViolation::SelfFollowing) => {}
            other => panic!("unexpected mapping: {:?}", other),
        }

        let err = ApiError::from(database_error(
            DatabaseErrorKind::UniqueViolation,
            "uniq_user_email",
        ));
        match err {
            ApiError::Constraint(ConstraintViolation::UniqueEmail) => {}
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn unknown_constraints_stay_diesel_errors() {
        let err = ApiError::from(database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "follows_user_id_fkey",
        ));
        match err {
            ApiError::Diesel(DieselError::DatabaseError(_, _)) => {}
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn not_found_stays_diesel_error() {
        match ApiError::from(DieselError::NotFound) {
            ApiError::Diesel(DieselError::NotFound) => {}
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn violations_know_their_constraint_names() {
        assert_eq!(ConstraintViolation::UniqFollow.constraint(), "uniq_follow");
        assert_eq!(
            ConstraintViolation::SelfFollowing.constraint(),
            "self_following"
        );
        for name in &[
            "uniq_user_email",
            "uniq_user_username",
            "uniq_follow",
            "self_following",
        ] {
            let violation = ConstraintViolation::from_constraint(name).unwrap();
            assert_eq!(violation.constraint(), *name);
        }
    }

    #[test]
    fn validation_errors_merge_per_field() {
        let mut errors = ValidationError::from("email", "invalid email");
        errors.merge(ValidationError::from("email", "email already exists"));
        errors.merge(ValidationError::from("username", "username too short"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.messages("email").unwrap().len(), 2);
        assert_eq!(errors.messages("username").unwrap().len(), 1);
    }

    #[test]
    fn constraint_errors_render_under_their_name() {
        let body = ApiError::Constraint(ConstraintViolation::UniqFollow).errors_json();
        assert_eq!(
            body["errors"]["uniq_follow"][0],
            "already following this author"
        );
    }
}
