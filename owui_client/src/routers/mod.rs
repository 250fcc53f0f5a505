mod chats;
mod knowledge;
mod models;
mod prompts;
mod users;

pub use chats::Chats;
pub use knowledge::Knowledge;
pub use models::Models;
pub use prompts::Prompts;
pub use users::Users;
