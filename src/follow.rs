use users::models::User;
use types::*;
use db::schema::follows;
use diesel::prelude::*;
use diesel::dsl::exists;
use diesel::{delete, insert_into, select};
use std::borrow::Cow;

/// A directed subscription edge: `user_id` follows `author_id`. Edges are
/// immutable; they are only ever created and deleted.
#[derive(Debug, Queryable, Identifiable, Serialize)]
#[table_name = "follows"]
pub struct Follow {
    pub id: i32,
    pub user_id: i32,
    pub author_id: i32,
}

#[derive(Debug, Serialize)]
pub struct Profile<'a> {
    pub username: Cow<'a, str>,
    pub first_name: Option<Cow<'a, str>>,
    pub last_name: Option<Cow<'a, str>>,
    pub following: bool,
}

impl Profile<'static> {
    fn from_user(user: User, following: bool) -> Profile<'static> {
        Profile {
            username: Cow::Owned(user.username),
            first_name: user.first_name.map(Cow::Owned),
            last_name: user.last_name.map(Cow::Owned),
            following: following,
        }
    }
}

fn ensure_not_self(current: &User, author: &User) -> Result<(), ApiError> {
    if current.id == author.id {
        Err(ConstraintViolation::SelfFollowing.into())
    } else {
        Ok(())
    }
}

pub fn profile(
    connection: &PgConnection,
    current_user: Option<&User>,
    name: &str,
) -> ApiResult<Profile<'static>> {
    let user = User::load_by_name(name, connection)?;
    let following = match current_user {
        Some(current) => is_following(connection, current, &user)?,
        None => false,
    };

    Ok(Profile::from_user(user, following))
}

pub fn is_following(
    connection: &PgConnection,
    follower: &User,
    author: &User,
) -> Result<bool, ApiError> {
    use db::schema::follows::dsl::*;

    let query = select(exists(
        follows
            .filter(user_id.eq(&follower.id))
            .filter(author_id.eq(&author.id)),
    ));
    query.get_result::<bool>(connection).map_err(|e| e.into())
}

/// Creates the edge. Self-follows are rejected here and again by the
/// `self_following` check constraint; a duplicate pair trips the
/// `uniq_follow` unique constraint and surfaces as a `ConstraintViolation`.
pub fn follow(
    connection: &PgConnection,
    current: &User,
    name: &str,
) -> ApiResult<Profile<'static>> {
    use db::schema::follows::dsl::*;

    let author = User::load_by_name(name, connection)?;
    ensure_not_self(current, &author)?;

    insert_into(follows)
        .values((user_id.eq(&current.id), author_id.eq(&author.id)))
        .execute(connection)?;

    Ok(Profile::from_user(author, true))
}

/// Deletes the edge if present; deleting an absent edge affects zero rows
/// and is not an error.
pub fn unfollow(
    connection: &PgConnection,
    current: &User,
    name: &str,
) -> ApiResult<Profile<'static>> {
    use db::schema::follows::dsl::*;

    let author = User::load_by_name(name, connection)?;
    delete(
        follows
            .filter(user_id.eq(&current.id))
            .filter(author_id.eq(&author.id)),
    ).execute(connection)?;

    Ok(Profile::from_user(author, false))
}

/// All authors the user currently follows, ordered by username.
pub fn subscriptions(connection: &PgConnection, current: &User) -> ApiResult<Vec<Profile<'static>>> {
    let author_ids = {
        use db::schema::follows::dsl::*;
        follows
            .filter(user_id.eq(&current.id))
            .select(author_id)
            .load::<i32>(connection)?
    };

    let authors = {
        use db::schema::users::dsl::*;
        users
            .filter(id.eq_any(&author_ids))
            .order(username.asc())
            .load::<User>(connection)?
    };

    Ok(authors
        .into_iter()
        .map(|author| Profile::from_user(author, true))
        .collect())
}
