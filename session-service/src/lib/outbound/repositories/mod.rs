pub mod memory;
pub mod refresh_token;
pub mod user;
pub mod visitor;

pub use memory::InMemoryCredentialStore;
pub use memory::InMemoryVisitorRecorder;
pub use refresh_token::PostgresRefreshTokenRepository;
pub use user::PostgresUserRepository;
pub use visitor::PostgresVisitorRecorder;
