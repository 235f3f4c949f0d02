mod event;
mod race;
mod record;
mod result;

pub use event::*;
pub use race::*;
pub use record::*;
pub use result::*;
