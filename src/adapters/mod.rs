// Adapters layer: concrete implementations of the domain ports (filesystem, terminal shell).

pub mod shell;
pub mod storage;

pub use shell::CliShell;
pub use storage::LocalStorage;
