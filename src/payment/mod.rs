// Payment field resolution and payment sessions

pub mod fee;
pub mod wallet;
pub mod session;

pub use fee::*;
pub use wallet::*;
pub use session::*;
