//! Parlor terminal chat entry point.

use std::io::{self, BufRead, Write};

use parlor::cli::{Cli, ReplCommand, HELP};
use parlor::config::ChatConfig;
use parlor::controller::ChatController;
use parlor::session::SessionId;
use parlor::types::TurnRole;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse_args();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.apply(ChatConfig::from_env());
    let mut chat = ChatController::from_config(config)?;
    if let Some(id) = cli.session.as_deref() {
        chat = chat.with_session(SessionId::from(id));
    }
    if let Some(name) = &cli.name {
        chat.set_agent_name(name.clone());
    }
    if let Some(system) = &cli.system {
        chat.set_instructions(system.clone());
    }
    if cli.no_time_tool {
        chat.set_time_tool_enabled(false);
    }

    if let Some(err) = chat.config_error() {
        eprintln!("⚠️ {err}");
    }
    eprintln!(
        "{} on {} (session {}). Type /help for commands.",
        chat.settings().name,
        chat.config().model(),
        chat.session_id()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match ReplCommand::parse(&line) {
            ReplCommand::Prompt(text) => match chat.submit_prompt(&text) {
                Ok(reply) => println!("{}: {}", chat.settings().name, reply.content),
                Err(e) => eprintln!("⚠️ {e}"),
            },
            ReplCommand::NewSession => {
                let id = chat.request_new_session()?;
                println!("Started session {id}");
            }
            ReplCommand::ShowSession => {
                println!("Session {}", chat.session_id());
                for (role, text) in chat.renderable_history() {
                    let who = match role {
                        TurnRole::User => "you",
                        TurnRole::Assistant => chat.settings().name.as_str(),
                    };
                    println!("  {who}: {text}");
                }
            }
            ReplCommand::Tools(enabled) => {
                chat.set_time_tool_enabled(enabled);
                println!("Time tool {}", if enabled { "enabled" } else { "disabled" });
            }
            ReplCommand::Instructions(text) => {
                chat.set_instructions(text);
                println!("Instructions updated");
            }
            ReplCommand::Name(name) => {
                chat.set_agent_name(name);
                println!("Agent renamed to {}", chat.settings().name);
            }
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => break,
            ReplCommand::Empty => {}
            ReplCommand::Unknown(input) => eprintln!("Unknown command: {input} (try /help)"),
        }
    }

    Ok(())
}
