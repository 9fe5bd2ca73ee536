use super::super::args::*;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Fetch(args) => super::fetch::run(args).await,
        Command::List(args) => super::list::run(args).await,
        Command::Resolve(args) => super::resolve::run(args).await,
    }
}
