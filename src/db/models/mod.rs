mod appointment;
mod availability;
mod notification;
mod party;

pub use appointment::*;
pub use availability::*;
pub use notification::*;
pub use party::*;
