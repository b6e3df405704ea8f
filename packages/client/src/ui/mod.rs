//! Console front end of the `chatwire` binary.

mod formatter;
mod runner;

pub use formatter::{
    format_error, format_friend_request, format_group, format_message, format_presence,
};
pub use runner::{Input, parse_input, run_client};
