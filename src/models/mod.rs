pub mod pagination;
pub mod tweet;
pub mod user;

pub use pagination::*;
pub use tweet::*;
pub use user::*;
