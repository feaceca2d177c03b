use clap::Subcommand;

mod inspect;
mod watch;

#[derive(Subcommand)]
pub enum KanshiCommand {
    Inspect(inspect::InspectCommand),
    Watch(watch::WatchCommand),
}

impl KanshiCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            KanshiCommand::Inspect(command) => command.run().await,
            KanshiCommand::Watch(command) => command.run().await,
        }
    }
}
