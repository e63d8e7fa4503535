//! CLI subcommands for the `client-loader` binary.
//!
//! ## Usage
//!
//! ```bash
//! client-loader resolve Views.List crm:Foo/Bar   # print fetch paths
//! client-loader load res!client/res/templates/a.tpl
//! client-loader config show                      # effective configuration
//! ```

pub mod config_cmd;
pub mod load_cmd;
pub mod resolve_cmd;

pub use load_cmd::run_load;
pub use resolve_cmd::run_resolve;

/// Exit code for success.
pub const EXIT_OK: i32 = 0;

/// Exit code for any failure.
pub const EXIT_FAILURE: i32 = 1;
