pub mod session;

pub use session::SessionToken;
