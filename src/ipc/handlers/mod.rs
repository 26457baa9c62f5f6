pub mod attendance;
pub mod core;
pub mod notifications;
pub mod session;
pub mod settings;
pub mod students;
