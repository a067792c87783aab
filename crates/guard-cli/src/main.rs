//! Guard CLI - command-line interface for the LLM guard layer

use std::io::{self, Read};

use clap::Parser;

use guard_core::{GuardConfig, GuardFacade, Message, Role};

#[derive(Parser)]
#[command(name = "guard")]
#[command(about = "Defense-in-depth guard layer for LLM-backed applications")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Scan a piece of text (or stdin, if --text is omitted) as a single user message
    Scan {
        /// Text to scan; reads stdin if omitted
        #[arg(short, long)]
        text: Option<String>,
        /// Session secret used to seed the integrity signer
        #[arg(short, long, default_value = "guard-cli-default-secret")]
        secret: String,
    },
    /// Build a facade from the default configuration and report whether it constructs cleanly
    Check {
        #[arg(short, long, default_value = "guard-cli-default-secret")]
        secret: String,
    },
    /// Show build and version information
    Status,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    match cli.command {
        Some(Commands::Scan { text, secret }) => {
            let text = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let mut facade = GuardFacade::new(GuardConfig::default(), secret)?;
            let messages = vec![Message::new(Role::User, text)];
            match facade.guard_input(&messages, None) {
                Ok(_) => println!("safe"),
                Err(err) => {
                    println!("blocked: {err}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Check { secret }) => match GuardFacade::new(GuardConfig::default(), secret) {
            Ok(_) => println!("configuration OK"),
            Err(err) => {
                println!("configuration error: {err}");
                std::process::exit(1);
            }
        },
        Some(Commands::Status) => {
            println!("guard-cli v{}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            println!("guard-cli v{} - use --help for commands", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
