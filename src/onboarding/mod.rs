//! Profile onboarding: the draft, its step schemas, and the wizard

mod draft;
mod schema;
mod wizard;

pub use draft::*;
pub use schema::*;
pub use wizard::*;
