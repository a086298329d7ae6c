//! Command handlers, one module per subcommand.

pub mod completion;
pub mod config_cmd;
pub mod rev_parse;
pub mod sync;
pub mod version;
