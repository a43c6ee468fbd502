mod repo;

#[cfg(feature = "postgres")]
mod postgres_repo;

pub use repo::{Repo, RepoError, SQLikeMigrations};

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresRepo, PostgresRepoConn, PostgresRepoPool};
