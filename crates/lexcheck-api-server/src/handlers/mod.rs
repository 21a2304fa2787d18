pub mod analysis;
pub mod api_key;
pub mod assistant;
pub mod credentials;
pub mod documents;
pub mod forms;
pub mod health;
pub mod history;

pub use credentials::{Credentials, USER_API_KEY_HEADER};
