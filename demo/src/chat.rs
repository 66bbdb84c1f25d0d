//! Interactive console session.

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use concierge_contracts::{error::ConciergeResult, execution::TurnOutcome};
use concierge_core::session::Context;
use concierge_support::SupportDesk;

const HELP: &str = "\
Commands:
  help          show this message
  show_context  print the session context as JSON
  tickets       list tickets opened in this session
  quit, exit    end the session
Anything else is sent to the active agent.";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Help,
    ShowContext,
    Tickets,
    Say(&'a str),
}

fn parse(line: &str) -> Command<'_> {
    match line.trim() {
        "help" | "?" => Command::Help,
        "show_context" => Command::ShowContext,
        "tickets" => Command::Tickets,
        other => Command::Say(other),
    }
}

/// Run a console session on stdin until the user quits or input ends.
pub fn run(desk: &SupportDesk) -> ConciergeResult<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("Welcome to the Concierge support desk. Type 'help' for commands.");
    println!();

    let Some(name) = prompt(&mut input, "Your name: ") else { return Ok(()) };
    let Some(email) = prompt(&mut input, "Your email (optional): ") else { return Ok(()) };
    let Some(premium) = prompt(&mut input, "Premium member? (y/n): ") else { return Ok(()) };

    let name = if name.is_empty() { "Guest".to_string() } else { name };
    let is_premium = matches!(premium.to_ascii_lowercase().as_str(), "y" | "yes");
    let mut context = desk.orchestrator().start_session(&name, is_premium);
    if !email.is_empty() {
        context = context.with_email(email);
    }

    let Some(mut line) = prompt(&mut input, "How can we help you today? ") else {
        return desk.orchestrator().close(&mut context);
    };

    loop {
        match parse(&line) {
            Command::Help => println!("{HELP}"),
            Command::ShowContext => show_context(&context),
            Command::Tickets => show_tickets(desk),
            Command::Say("") => {}
            Command::Say(text) => {
                let outcome = desk.orchestrator().run_turn(&mut context, text)?;
                if print_outcome(&outcome) {
                    break;
                }
            }
        }

        match prompt(&mut input, "You: ") {
            Some(next) => line = next,
            None => {
                desk.orchestrator().close(&mut context)?;
                break;
            }
        }
    }

    debug!(session_id = %context.session_id(), turns = context.turn(), "console session ended");
    println!("Goodbye, {}.", context.user_name());
    Ok(())
}

/// Print and flush `label`, then read one trimmed line. `None` at end of input.
fn prompt(input: &mut impl BufRead, label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()),
        Err(e) => {
            warn!(error = %e, "failed to read console input");
            None
        }
    }
}

/// Print a turn outcome. Returns true once the session is closed.
fn print_outcome(outcome: &TurnOutcome) -> bool {
    match outcome {
        TurnOutcome::Closed => true,
        TurnOutcome::Unavailable { message } => {
            println!("System: {message}");
            false
        }
        other => {
            for turn in other.emitted() {
                println!("{turn}");
            }
            false
        }
    }
}

fn show_context(context: &Context) {
    match serde_json::to_string_pretty(&context.view()) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("could not serialize context: {e}"),
    }
}

fn show_tickets(desk: &SupportDesk) {
    let tickets = desk.tickets().list();
    if tickets.is_empty() {
        println!("No tickets yet.");
        return;
    }
    for ticket in tickets {
        println!(
            "{}  [{}] {:?}  {}",
            ticket.id, ticket.category, ticket.status, ticket.title
        );
    }
}
