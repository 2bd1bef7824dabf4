use warp::reject::Reject;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid command")]
    InvalidCommand,
    #[error("unauthorized")]
    Unauthorized,
    #[error("failed to decode auth header")]
    HeaderDecode,
    #[error("entry not found")]
    NotFound,
    #[error("db error: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("failed to hash password: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("unknown error")]
    Unknown,
}

impl Reject for Error {}

impl Error {
    pub fn into_rejection(self) -> warp::Rejection {
        warp::reject::custom(self)
    }
}
