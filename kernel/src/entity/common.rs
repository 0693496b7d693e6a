mod flag;
mod lifecycle;
mod time;
mod version;

pub use self::{flag::*, lifecycle::*, time::*, version::*};
