pub mod time;

mod scoped_timer;
pub(crate) use scoped_timer::*;
