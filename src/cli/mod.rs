pub mod commands;
pub mod ui;
pub mod util;

pub use ui::output::Output;
pub use util::{read_json_input, write_or_print};
