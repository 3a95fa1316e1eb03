use clap::Parser;
use slack_collector::cli::{Cli, Commands};
use slack_collector::commands;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    slack_collector::init_tracing();

    let result = match cli.command {
        Commands::Version => {
            commands::run_version();
            Ok(())
        }
        Commands::Merge {
            directory,
            dir,
            pattern,
            recursive,
        } => commands::merge_input(directory, dir, pattern, recursive).and_then(commands::run_merge),
        Commands::Get { url, thread } => {
            match commands::load_settings(cli.config.as_deref(), cli.token) {
                Ok(settings) => commands::run_get(&settings, url, thread).await,
                Err(e) => Err(e),
            }
        }
        Commands::List(args) => match commands::load_settings(cli.config.as_deref(), cli.token) {
            Ok(settings) => commands::run_list(&settings, args).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
