//! Interactive shell.
//!
//! One shell run is one dashboard session: the cart lives until the shell
//! exits, and the session is kept on disk only if a session file is set.

use std::io::{self, Write};

use clap::Parser;
use slooze_dashboard::Dashboard;
use slooze_dashboard::api::OrderingApi;
use slooze_dashboard::notify::{Notification, Notifier};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::commands::{self, CliError, Flow, ShellLine};
use crate::render;

/// Prints notifications to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "\n  >> {}\n     {}\n", notification.title, notification.body);
    }
}

/// Split a shell line into arguments, honoring single and double quotes.
///
/// # Errors
///
/// Returns an error if a quote is left open.
pub fn split_args(line: &str) -> Result<Vec<String>, CliError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_arg = false;

    for c in line.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_arg = true;
            }
            None if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(c);
                in_arg = true;
            }
        }
    }

    if quote.is_some() {
        return Err(CliError::Usage("unterminated quote".to_string()));
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

fn prompt<A: OrderingApi>(dashboard: &Dashboard<A>) -> String {
    match dashboard.current_user() {
        Some(user) => format!(
            "slooze ({} {}, cart {})> ",
            user.first_name(),
            user.role,
            dashboard.cart().item_count()
        ),
        None => "slooze> ".to_string(),
    }
}

/// Read commands from stdin until `quit` or end of input.
///
/// # Errors
///
/// Returns an error only if the terminal itself fails.
pub async fn run<A: OrderingApi>(dashboard: &mut Dashboard<A>) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = io::stdout();

    writeln!(out, "Slooze dashboard. Type `help` for commands.")?;
    if let Some(user) = dashboard.current_user() {
        writeln!(out, "Welcome back, {}.", user.first_name())?;
    }

    loop {
        write!(out, "{}", prompt(dashboard))?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let args = match split_args(&line) {
            Ok(args) if args.is_empty() => continue,
            Ok(args) => args,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                continue;
            }
        };

        let command = match ShellLine::try_parse_from(args) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                write!(out, "{}", e.render())?;
                continue;
            }
        };
        debug!(?command, "Shell command");

        let flow = match commands::execute(dashboard, command, &mut out).await {
            Ok(flow) => flow,
            // Already queued as a notice.
            Err(CliError::Dashboard(_)) => Flow::Continue,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                Flow::Continue
            }
        };

        render::write_notices(&mut out, &dashboard.take_notices())?;
        if flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}
