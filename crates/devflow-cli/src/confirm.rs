//! Interactive commit message confirmation.

use devflow_orchestrator::MessageConfirmer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

/// Asks on the terminal whether to accept, edit or retype a commit message.
///
/// Edit works on the subject line and keeps any body. Interrupting the
/// prompt (Ctrl-C, Ctrl-D) or a terminal error accepts the proposal.
#[derive(Debug, Default)]
pub struct InteractiveConfirmer;

enum Choice {
    Accept,
    Edit,
    Retype,
}

fn parse_choice(answer: &str) -> Option<Choice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Some(Choice::Accept),
        "e" | "edit" => Some(Choice::Edit),
        "r" | "retype" => Some(Choice::Retype),
        _ => None,
    }
}

/// Replaces the subject line of `message`, keeping the body.
fn replace_subject(message: &str, subject: &str) -> String {
    match message.split_once('\n') {
        Some((_, body)) => format!("{}\n{}", subject.trim(), body),
        None => subject.trim().to_string(),
    }
}

impl InteractiveConfirmer {
    fn ask(&self, proposed: &str) -> Result<String, ReadlineError> {
        let mut editor = DefaultEditor::new()?;
        println!("\nProposed commit message:\n");
        for line in proposed.lines() {
            println!("    {}", line);
        }
        println!();

        loop {
            let answer = editor.readline("Use this message? [Y]es / [e]dit / [r]etype: ")?;
            match parse_choice(&answer) {
                Some(Choice::Accept) => return Ok(proposed.to_string()),
                Some(Choice::Edit) => {
                    let subject = proposed.lines().next().unwrap_or_default();
                    let edited = editor.readline_with_initial("subject> ", (subject, ""))?;
                    if !edited.trim().is_empty() {
                        return Ok(replace_subject(proposed, &edited));
                    }
                }
                Some(Choice::Retype) => {
                    let typed = editor.readline("message> ")?;
                    if !typed.trim().is_empty() {
                        return Ok(typed.trim().to_string());
                    }
                }
                None => println!("Please answer y, e or r."),
            }
        }
    }
}

impl MessageConfirmer for InteractiveConfirmer {
    fn confirm(&self, proposed: &str) -> String {
        match self.ask(proposed) {
            Ok(message) => message,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => proposed.to_string(),
            Err(e) => {
                warn!(error = %e, "could not read from terminal, keeping proposed message");
                proposed.to_string()
            }
        }
    }
}
