use std::str::FromStr;
use types::ApiError;
use users::models::User;

/// HTTP-style method names as the routing layer hands them over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(value: &str) -> Result<Method, String> {
        match value {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unrecognized method: {}", other)),
        }
    }
}

/// A domain object owned by a user, e.g. a recipe.
pub trait Authored {
    fn author_id(&self) -> i32;
}

/// Object-level gate for mutating recipe-like resources: any authenticated
/// user may create; only the author or an admin may touch an existing
/// object; unauthenticated callers are always denied.
pub struct IsAuthorOrAdmin;

impl IsAuthorOrAdmin {
    pub fn has_object_permission<T: Authored>(
        user: Option<&User>,
        object: &T,
        method: Method,
    ) -> bool {
        match user {
            None => false,
            Some(user) => {
                user.is_admin() || object.author_id() == user.id || method == Method::Post
            }
        }
    }

    pub fn check<T: Authored>(
        user: Option<&User>,
        object: &T,
        method: Method,
    ) -> Result<(), ApiError> {
        if Self::has_object_permission(user, object, method) {
            Ok(())
        } else {
            Err(ApiError::PermissionDenied)
        }
    }
}
