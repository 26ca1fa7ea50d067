mod consent_repo_mysql;

pub use consent_repo_mysql::*;
