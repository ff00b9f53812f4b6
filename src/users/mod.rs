pub mod models;
mod utils;

use types::{ApiError, ApiResult, ConstraintViolation, Validate, ValidationError};
use db::schema::users;
use diesel::prelude::*;
use diesel::dsl::exists;
use diesel::{delete as diesel_delete, insert_into, select, update as diesel_update};

pub use self::utils::*;
use self::models::{NewUser, Role, User};

#[derive(Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Registration {
    // Everything that can be checked without touching the database.
    fn check_fields(&self) -> ValidationError {
        let mut errors = ValidationError::default();

        if self.username.is_empty() {
            errors.add_error("username", "this field is required");
        } else if let Err(e) = validate_username_re(&self.username) {
            errors.merge(e);
        }

        if self.email.is_empty() {
            errors.add_error("email", "this field is required");
        } else if let Err(e) = validate_email_re(&self.email) {
            errors.merge(e);
        }

        if self.password.is_empty() {
            errors.add_error("password", "this field is required");
        } else if let Err(e) = validate_password(&self.password) {
            errors.merge(e);
        }

        if let Some(ref name) = self.first_name {
            if let Err(e) = validate_name("first_name", name) {
                errors.merge(e);
            }
        }

        if let Some(ref name) = self.last_name {
            if let Err(e) = validate_name("last_name", name) {
                errors.merge(e);
            }
        }

        errors
    }
}

impl Validate for Registration {
    type Error = ApiError;
    fn validate(self, connection: &PgConnection) -> Result<Self, Self::Error> {
        use db::schema::users::dsl::*;

        let errors = self.check_fields();
        if errors.len() > 0 {
            return Err(errors.into());
        }

        // Taken email/username fail exactly as the unique constraints
        // would, whichever side of the race catches them.
        validate_email(&self.email, connection)?;

        let username_taken = select(exists(users.filter(username.eq(&self.username))))
            .get_result::<bool>(connection)?;
        validate_unique(username_taken, ConstraintViolation::UniqueUsername)?;

        Ok(self)
    }
}

/// Creates a user. Uniqueness is pre-checked and fails with the same
/// `ConstraintViolation` the table constraints raise when a concurrent
/// writer wins the race past the pre-check.
pub fn register(connection: &PgConnection, registration: Registration) -> ApiResult<User> {
    use db::schema::users::dsl::*;

    let registration = registration.validate(connection)?;
    let new_user = NewUser {
        username: registration.username,
        email: registration.email,
        first_name: registration.first_name,
        last_name: registration.last_name,
        role: Role::default(),
        password: User::make_password(&registration.password)?,
    };

    let user = insert_into(users)
        .values(&new_user)
        .get_result::<User>(connection)?;
    Ok(user)
}

#[derive(Debug, Deserialize, AsChangeset)]
#[table_name = "users"]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UpdateUser {
    fn has_changes(&self) -> bool {
        self.username.is_some() || self.email.is_some() || self.password.is_some()
            || self.first_name.is_some() || self.last_name.is_some()
    }
}

/// Profile update. Role, capability flags and `date_joined` are not part of
/// the changeset; `date_joined` is set once at registration.
pub fn update(connection: &PgConnection, user: &User, update: UpdateUser) -> ApiResult<User> {
    use db::schema::users::dsl::*;

    let mut error = ValidationError::default();
    let mut changes = update;

    if let Some(ref new_email) = changes.email {
        if let Err(e) = validate_email_re(new_email) {
            error.merge(e);
        }
    }

    if let Some(ref new_username) = changes.username {
        if let Err(e) = validate_username_re(new_username) {
            error.merge(e);
        }
    }

    if let Some(ref name) = changes.first_name {
        if let Err(e) = validate_name("first_name", name) {
            error.merge(e);
        }
    }

    if let Some(ref name) = changes.last_name {
        if let Err(e) = validate_name("last_name", name) {
            error.merge(e);
        }
    }

    if let Some(new_password) = changes.password.take() {
        match validate_password(&new_password) {
            Err(e) => {
                error.merge(e);
            }
            Ok(_) => {
                changes.password = Some(User::make_password(&new_password)?);
            }
        }
    }

    if !error.empty() {
        return Err(error.into());
    }

    if let Some(ref new_email) = changes.email {
        let expr = users.filter(email.eq(new_email)).filter(id.ne(user.id));
        let email_taken = select(exists(expr)).get_result::<bool>(connection)?;
        validate_unique(email_taken, ConstraintViolation::UniqueEmail)?;
    }

    if let Some(ref new_username) = changes.username {
        let expr = users
            .filter(username.eq(new_username))
            .filter(id.ne(user.id));
        let username_taken = select(exists(expr)).get_result::<bool>(connection)?;
        validate_unique(username_taken, ConstraintViolation::UniqueUsername)?;
    }

    if !changes.has_changes() {
        return User::load_by_id(user.id, connection);
    }

    let updated = diesel_update(users.filter(id.eq(user.id)))
        .set(&changes)
        .get_result::<User>(connection)?;
    Ok(updated)
}

/// Removes the user row; follow edges referencing it on either side go with
/// it through the cascading foreign keys.
pub fn delete(connection: &PgConnection, user: &User) -> ApiResult<usize> {
    use db::schema::users::dsl::*;
    diesel_delete(users.filter(id.eq(user.id)))
        .execute(connection)
        .map_err(|e| e.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            username: "chef".to_string(),
            email: "chef@example.com".to_string(),
            password: "s3cret".to_string(),
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn complete_registration_passes_field_checks() {
        assert!(registration().check_fields().empty());
    }

    #[test]
    fn missing_required_fields_are_reported_per_field() {
        let mut r = registration();
        r.username = String::new();
        r.email = String::new();
        r.password = String::new();

        let errors = r.check_fields();
        assert_eq!(errors.len(), 3);
        assert!(errors.messages("username").is_some());
        assert!(errors.messages("email").is_some());
        assert!(errors.messages("password").is_some());
    }

    #[test]
    fn bad_fields_are_collected_not_short_circuited() {
        let mut r = registration();
        r.username = "a b".to_string();
        r.email = "not-an-email".to_string();
        r.password = "123".to_string();
        r.first_name = Some("x".repeat(LEN_NAME + 1));

        let errors = r.check_fields();
        assert!(errors.messages("username").is_some());
        assert!(errors.messages("email").is_some());
        assert!(errors.messages("password").is_some());
        assert!(errors.messages("first_name").is_some());
    }

    #[test]
    fn empty_update_has_no_changes() {
        let update = UpdateUser {
            username: None,
            email: None,
            password: None,
            first_name: None,
            last_name: None,
        };
        assert!(!update.has_changes());
    }
}
