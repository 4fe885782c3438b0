use clap::Parser;
use teamgate::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli::bootstrap();

    match cli.command {
        Command::Config => cli::tools::show_config(&config),
        Command::HashPassword { password } => cli::tools::hash_password(&config, password),
        Command::Demo => cli::demo::run(&config).await,
    }
}
