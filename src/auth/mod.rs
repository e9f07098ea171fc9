pub mod bootstrap;
pub mod password;
pub mod session;

pub use session::{IssuedSession, SessionStore};
