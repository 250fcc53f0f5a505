pub mod dispatch;
pub mod schema;
