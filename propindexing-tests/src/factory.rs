mod contracts;
mod handlers;
mod logs;
mod providers;

pub use contracts::*;
pub use handlers::*;
pub use logs::*;
pub use providers::*;
