pub mod store;
pub mod types;

pub use store::FlagStore;
pub use types::{FlagName, FlagSet};
