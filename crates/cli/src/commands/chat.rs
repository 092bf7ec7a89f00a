//! `campusdesk chat` — Terminal chat with a single in-process session.

use campusdesk_config::AppConfig;
use campusdesk_core::session::Session;
use campusdesk_dialog::DialogMachine;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

const GOODBYE: &str = "Goodbye! Have a great day.";

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let machine = campusdesk_gateway::build_machine(&config).await?;

    println!();
    println!("=======================================================");
    println!("🎓 CampusDesk Admin Assistant Ready!");
    println!("=======================================================");
    println!("Type 'quit' to exit.");
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    converse(&machine, stdin, &mut std::io::stdout()).await?;

    Ok(())
}

/// Run turns from `input` until `quit` or end of input.
async fn converse<R, W>(machine: &DialogMachine, input: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut session = Session::new();

    loop {
        write!(out, "Student: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            return Ok(());
        };
        if line.trim().eq_ignore_ascii_case("quit") {
            writeln!(out, "Bot: {GOODBYE}")?;
            return Ok(());
        }

        let turn = machine.respond(session, &line).await;
        session = turn.session;
        debug!(outcome = ?turn.outcome, "Turn complete");
        writeln!(out, "Bot: {}", turn.reply)?;
        writeln!(out)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusdesk_classifier::KeywordClassifier;
    use campusdesk_core::catalog::IntentCatalog;
    use campusdesk_records::InMemoryRecords;
    use campusdesk_security::WerkzeugVerifier;
    use std::sync::Arc;

    fn machine() -> DialogMachine {
        let catalog = Arc::new(
            IntentCatalog::from_json(
                r#"{"intents": [
                    {"tag": "greeting", "patterns": ["hello"], "responses": ["Hi there!"]},
                    {"tag": "check_fees", "patterns": ["what are my fees"]}
                ]}"#,
            )
            .unwrap(),
        );
        DialogMachine::new(
            Arc::new(KeywordClassifier::from_catalog(&catalog)),
            catalog,
            Arc::new(InMemoryRecords::new()),
            Arc::new(WerkzeugVerifier::new()),
        )
    }

    async fn transcript(input: &str) -> String {
        let mut out = Vec::new();
        converse(&machine(), input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn quit_ends_the_loop() {
        let text = transcript("hello\nquit\nhello\n").await;
        assert!(text.contains("Bot: Hi there!"));
        assert!(text.ends_with("Bot: Goodbye! Have a great day.\n"));
        assert_eq!(text.matches("Hi there!").count(), 1);
    }

    #[tokio::test]
    async fn session_carries_across_lines() {
        let text = transcript("what are my fees\n22/03CYB059 1234\n").await;
        assert!(text.contains("This request requires authentication"));
        assert!(text.contains("Invalid format"));
    }
}
