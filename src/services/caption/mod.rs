pub mod formatter;
pub mod impl_fake;
pub mod model_manager;
pub mod session;
