pub mod dispatch;
pub mod fetch;
pub mod list;
pub mod resolve;

pub use dispatch::dispatch;
