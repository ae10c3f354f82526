//! Fixed database credentials shared by the database, application, and
//! command-runner services.

use std::collections::BTreeMap;

pub const DB_USER: &str = "root";
pub const DB_PASSWORD: &str = "password";
pub const DB_NAME: &str = "wordpress";

/// Environment variables the WordPress images read to reach the database.
/// The database host is left to the image default (`mysql`), which matches
/// the database service name.
pub fn database_environment() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("WORDPRESS_DB_USER".to_owned(), DB_USER.to_owned()),
        ("WORDPRESS_DB_PASSWORD".to_owned(), DB_PASSWORD.to_owned()),
        ("WORDPRESS_DB_NAME".to_owned(), DB_NAME.to_owned()),
    ])
}
