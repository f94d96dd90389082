pub mod follow;
pub mod like;
pub mod tweet;
pub mod user;
