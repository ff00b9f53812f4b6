use diesel::prelude::*;
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use db::schema::users;
use crypto::pbkdf2::*;
use chrono::NaiveDateTime;
use std::io::Result as IoResult;
use std::io::Write;
use std::str::FromStr;
use types::ApiError;

/// Closed set of user roles, stored as text. Staff/superuser flags live on
/// the record itself; the capability checks below combine both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsExpression, FromSqlRow, Serialize, Deserialize)]
#[sql_type = "Text"]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Role {
        Role::User
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Role, String> {
        match value {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unrecognized role: {}", other)),
        }
    }
}

impl ToSql<Text, Pg> for Role {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Role {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Role> {
        let value = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        value.parse::<Role>().map_err(|e| e.into())
    }
}

#[derive(Debug, Queryable, Identifiable, Serialize)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    #[serde(serialize_with = "::utils::serialize_date")]
    pub date_joined: NaiveDateTime,
}

impl User {
    pub fn is_moderator(&self) -> bool {
        self.is_staff || self.role == Role::Moderator
    }

    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.role == Role::Admin
    }

    pub fn full_name(&self) -> String {
        let first = self.first_name.as_ref().map(String::as_str).unwrap_or("");
        let last = self.last_name.as_ref().map(String::as_str).unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }

    pub fn make_password(password: &str) -> IoResult<String> {
        pbkdf2_simple(password, 1000)
    }

    pub fn new_password(&mut self, password: &str) -> IoResult<()> {
        self.password = pbkdf2_simple(password, 1000)?;
        Ok(())
    }

    pub fn verify_password(&self, password_to_verify: &str) -> Result<bool, ApiError> {
        let check = pbkdf2_check(password_to_verify, &self.password);
        check.map_err(|_| ApiError::Internal)
    }

    pub fn load_by_id(user_id: i32, connection: &PgConnection) -> Result<User, ApiError> {
        use db::schema::users::dsl::*;
        users
            .filter(id.eq(user_id))
            .get_result::<User>(connection)
            .map_err(|e| e.into())
    }

    pub fn load_by_name(name: &str, connection: &PgConnection) -> Result<User, ApiError> {
        use db::schema::users::dsl::*;
        users
            .filter(username.eq(&name))
            .get_result::<User>(connection)
            .map_err(|e| e.into())
    }

    pub fn load_by_email(user_email: &str, connection: &PgConnection) -> Result<User, ApiError> {
        use db::schema::users::dsl::*;
        users
            .filter(email.eq(&user_email))
            .get_result::<User>(connection)
            .map_err(|e| e.into())
    }
}

#[derive(Debug, Deserialize, Insertable, Serialize)]
#[table_name = "users"]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub password: String,
}
