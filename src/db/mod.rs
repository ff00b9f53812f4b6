use diesel::pg::PgConnection;
use dotenv::dotenv;
use std::env;
use r2d2_diesel::ConnectionManager;
use r2d2;
use diesel::result::Error as DieselError;
use std::ops::Deref;

pub mod schema;

// An alias to the type for a pool of Diesel Postgres connections.
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub struct DbConnection(pub r2d2::PooledConnection<ConnectionManager<PgConnection>>);

error_chain! {
    foreign_links {
        Var(::std::env::VarError);
        R2D2(r2d2::Error);
        Diesel(DieselError);
    }
}

// For the convenience of using an &DbConnection as an &PgConnection.
impl Deref for DbConnection {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub fn init_pool() -> Result<Pool> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL")?;
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Ok(Pool::new(manager)?)
}

/// Checks out a single connection from the pool. The routing layer calls
/// this once per request and hands the connection to the operations below.
pub fn get_connection(pool: &Pool) -> Result<DbConnection> {
    let connection = pool.get()?;
    Ok(DbConnection(connection))
}
