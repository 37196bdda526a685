pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "coursey",
    about = "Coursey operator CLI",
    long_about = "Operate Coursey migrations, catalog seeding, config inspection, and local chat smoke runs.",
    after_help = "Examples:\n  coursey migrate\n  coursey seed\n  coursey chat \"我想要3学分的选修课\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic course catalog seed")]
    Seed,
    #[command(about = "Submit one chat turn against the local database and print the reply")]
    Chat {
        #[arg(help = "User utterance to submit")]
        message: String,
        #[arg(long, help = "Existing conversation id to continue")]
        conversation: Option<String>,
        #[arg(long, default_value = "local", help = "User id the conversation belongs to")]
        user: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Chat { message, conversation, user } => {
            commands::chat::run(&message, conversation.as_deref(), &user)
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
