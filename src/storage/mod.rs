mod json_store;
mod util;

pub use json_store::{Collection, JsonStore};
