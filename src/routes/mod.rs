mod emails;
mod health;

pub use emails::*;
pub use health::*;
