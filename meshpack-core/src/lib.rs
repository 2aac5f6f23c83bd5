//! Core library for dependency-ordered monorepo task orchestration.

pub mod config;
pub mod error;
pub mod graph;
pub mod linker;
pub mod manifest;
pub mod package;
pub mod report;
pub mod runner;
pub mod scanner;
pub mod scheduler;
pub mod selection;
pub mod task;

pub use config::WorkspaceConfig;
pub use error::{Error, ErrorKind, Result};
pub use graph::{EdgeKind, PackageGraph};
pub use linker::{LinkSummary, Linker};
pub use manifest::Manifest;
pub use package::Package;
pub use report::{Outcome, RunReport, SkipReason};
pub use runner::{default_concurrency, AbortHandle, TaskRunner};
pub use scanner::Scanner;
pub use scheduler::{PackageState, Scheduler};
pub use selection::{select, Selection, SelectionFilter};
pub use task::{OutputHandler, PackageTask, TaskEnvironment};
