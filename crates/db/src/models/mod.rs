pub mod prediction;
pub mod session;
pub mod user;
pub mod user_image;
