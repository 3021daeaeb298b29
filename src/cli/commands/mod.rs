//! CLI command implementations.

mod collect;
mod init;
mod logs;
mod serve;
mod source;

pub use collect::cmd_collect;
pub use init::cmd_init;
pub use logs::cmd_logs;
pub use serve::cmd_serve;
pub use source::{
    cmd_source_add, cmd_source_list, cmd_source_remove, cmd_source_set_enabled, NewSourceArgs,
};
