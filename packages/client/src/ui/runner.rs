//! Interactive session loop.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    config::ClientConfig, error::ClientError, listener::Listeners, supervisor::ChatConnection,
};

use super::formatter::{
    format_error, format_friend_request, format_group, format_message, format_presence,
};

const PROMPT: &str = "> ";

const HELP: &str = "Commands: /status, /help, /quit. Any other line is sent as a message.";

/// A line typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Quit,
    Status,
    Help,
    Empty,
    Text(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/status" => Input::Status,
        "/help" => Input::Help,
        _ => Input::Text(line.trim_end()),
    }
}

/// Run an interactive session until `/quit`, Ctrl-C or Ctrl-D.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let connection = ChatConnection::websocket(config.policy)?;
    register_printers(connection.listeners());
    connection.init(config.server_url.clone(), config.user_id);

    let (line_tx, mut lines) = mpsc::unbounded_channel::<String>();
    let prompt = tokio::task::spawn_blocking(move || read_lines(line_tx));

    println!("{HELP}");
    while let Some(line) = lines.recv().await {
        match parse_input(&line) {
            Input::Quit => break,
            Input::Empty => {}
            Input::Help => println!("{HELP}"),
            Input::Status => println!(
                "{} to {} as user {}",
                connection.state(),
                config.server_url,
                config.user_id
            ),
            Input::Text(text) => match config.compose(text) {
                Some(message) => connection.send(&message),
                None => println!("No recipient configured; start with --to-user or --to-group"),
            },
        }
    }

    connection.disconnect();
    connection.flush_callbacks().await;
    tracing::info!("Session closed");

    // The prompt thread stops after forwarding a quit command, so this does
    // not wait on stdin.
    match prompt.await {
        Ok(result) => result?,
        Err(e) => tracing::warn!("Prompt task failed: {}", e),
    }
    Ok(())
}

fn register_printers(listeners: &Listeners) {
    listeners
        .messages()
        .subscribe(|message| println!("{}", format_message(message)));
    listeners
        .presence()
        .subscribe(|users| println!("{}", format_presence(users)));
    listeners
        .errors()
        .subscribe(|error| println!("{}", format_error(error)));
    listeners
        .friend_requests_received()
        .subscribe(|request| println!("{}", format_friend_request("Friend request", request)));
    listeners
        .friend_requests_sent()
        .subscribe(|request| println!("{}", format_friend_request("Request sent", request)));
    listeners
        .friend_request_results()
        .subscribe(|request| println!("{}", format_friend_request("Request answered", request)));
    listeners
        .groups_created()
        .subscribe(|group| println!("{}", format_group(group)));
}

fn read_lines(lines: mpsc::UnboundedSender<String>) -> Result<(), ReadlineError> {
    let mut editor = DefaultEditor::new()?;
    forward_lines(
        || {
            let line = editor.readline(PROMPT)?;
            let _ = editor.add_history_entry(line.as_str());
            Ok(line)
        },
        &lines,
    )
}

/// Forward lines from `next_line` until a quit command, end of input or a
/// closed receiver. Ctrl-C and Ctrl-D are forwarded as `/quit`.
fn forward_lines(
    mut next_line: impl FnMut() -> Result<String, ReadlineError>,
    lines: &mpsc::UnboundedSender<String>,
) -> Result<(), ReadlineError> {
    loop {
        match next_line() {
            Ok(line) => {
                let quit = matches!(parse_input(&line), Input::Quit);
                if lines.send(line).is_err() || quit {
                    return Ok(());
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                let _ = lines.send("/quit".to_string());
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}
