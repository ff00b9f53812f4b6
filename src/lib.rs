#[macro_use]
extern crate diesel;
extern crate r2d2;
extern crate r2d2_diesel;

#[macro_use]
extern crate error_chain;

extern crate chrono;
extern crate crypto;
extern crate dotenv;
#[macro_use]
extern crate lazy_static;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;

pub mod db;
pub mod users;
pub mod types;
pub mod utils;
pub mod follow;
pub mod permissions;
