pub mod classify;
pub mod patterns;
pub mod prompt;
pub mod signals;
