pub mod exec;
pub mod install;
pub mod list;
pub mod process;
pub mod run;

pub use exec::ExecTask;
pub use install::InstallTask;
pub use list::ListTask;
pub use run::RunScriptTask;

fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
