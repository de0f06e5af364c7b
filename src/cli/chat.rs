//! Interactive session driver: read a query, answer it, repeat.

use std::future::Future;
use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent::ChatSession;
use crate::config::ChatConfig;
use crate::error::ChatError;

use super::{event_printer, Cli};

/// `exit` or `quit`, in any case.
pub fn is_exit_command(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Run the read-query loop until the user quits or input ends.
///
/// `interrupt` resolves when the user asks to stop: during a query it
/// cancels that query, at the prompt it ends the loop. Query-level errors
/// are printed and the loop continues; session-fatal errors are returned.
pub async fn run_chat_loop<R, W, I, Fut>(
    session: &mut ChatSession,
    input: R,
    out: &mut W,
    mut interrupt: I,
) -> Result<(), ChatError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    I: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    writeln!(out, "\nMCP Client Started!")?;
    writeln!(out, "Type 'exit' or 'quit' to stop the client.")?;

    let mut lines = input.lines();
    loop {
        write!(out, "\nEnter your query: ")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupt() => {
                writeln!(out)?;
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit_command(query) {
            break;
        }

        let cancel = CancellationToken::new();
        let result = {
            let query_future = session.process_query(query, &cancel);
            tokio::pin!(query_future);
            loop {
                tokio::select! {
                    result = &mut query_future => break result,
                    _ = interrupt(), if !cancel.is_cancelled() => cancel.cancel(),
                }
            }
        };

        match result {
            Ok(outcome) => writeln!(out, "\n{}", outcome.answer)?,
            Err(ChatError::Canceled) => writeln!(out, "\nQuery canceled.")?,
            Err(e) if e.is_fatal_for_session() => {
                writeln!(out, "\nAn error occurred: {e}")?;
                return Err(e);
            }
            Err(e) => {
                warn!(
                    error = %e,
                    category = ?e.category(),
                    recovery = ?e.recovery_suggestion(),
                    "query failed"
                );
                writeln!(out, "\nAn error occurred: {e}")?;
            }
        }
    }
    Ok(())
}

/// Wait for Ctrl-C; never resolves if the signal cannot be installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Connect to the server named on the command line and chat on stdin/stdout.
///
/// The server is shut down however the loop ends.
pub async fn run(cli: Cli) -> Result<(), ChatError> {
    let script = cli
        .server_script
        .clone()
        .ok_or_else(|| ChatError::Startup("no server script given".into()))?;

    let mut config = ChatConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    info!(?config, "configuration loaded");

    let mut session = ChatSession::connect(&script, &config)
        .await?
        .with_event_sink(event_printer(cli.verbose));

    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "\nConnected to server with tools: {:?}",
        session.tool_names()
    )?;

    let stdin = BufReader::new(tokio::io::stdin());
    let result = run_chat_loop(&mut session, stdin, &mut stdout, ctrl_c).await;

    let closed = session.close().await;
    if let Err(e) = &closed {
        warn!(error = %e, "tool server did not shut down cleanly");
    }
    result.and(closed)
}
