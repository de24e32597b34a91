pub mod interactions;
pub mod surface;
