pub mod discussion;
pub mod event;
pub mod school;
pub mod session;
pub mod static_data;
pub mod user;
