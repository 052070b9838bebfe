pub mod cancel;
pub mod feedback;
