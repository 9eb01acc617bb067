// User administration: persistence collaborator for the auth core plus admin CRUD

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{User, UserResponse};
pub use repository::{InMemoryUserStore, UserRepository, UserStore};
pub use service::UserService;
