use clap::Parser;

mod commands;
mod config;
mod platforms;
mod recorder;
mod store;

#[derive(Parser)]
#[clap(name = "kanshi", version, about)]
struct KanshiArgs {
    #[clap(subcommand)]
    command: commands::KanshiCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .try_from_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = KanshiArgs::parse();
    args.command.run().await
}
