//! Session store adapters.

mod file;
mod memory;

pub use file::{DEFAULT_SESSION_FILE, FileSessionStore};
pub use memory::InMemorySessionStore;
