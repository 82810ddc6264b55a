use std::io::{self, BufRead, Write};

use agora_core::{PassphraseEntry, PassphraseProvider, PassphrasePrompt, PromptPurpose, ShareTtl};

/// Reads the passphrase from `AGORA_PASSPHRASE`, or from stdin when unset.
/// An empty line or end of input cancels.
pub struct TerminalPassphrase {
    pub ttl: ShareTtl,
    pub hint: Option<String>,
    pub from_env: Option<String>,
}

impl TerminalPassphrase {
    pub fn new(ttl: ShareTtl, hint: Option<String>) -> Self {
        Self {
            ttl,
            hint,
            from_env: std::env::var("AGORA_PASSPHRASE").ok().filter(|p| !p.is_empty()),
        }
    }
}

impl PassphraseProvider for TerminalPassphrase {
    async fn request(&self, purpose: PromptPurpose) -> PassphrasePrompt {
        let entry = |passphrase: String, confirmed: String| {
            PassphrasePrompt::Provided(PassphraseEntry {
                passphrase,
                confirmed: Some(confirmed),
                ttl: self.ttl,
                hint: self.hint.clone(),
            })
        };

        if let Some(passphrase) = &self.from_env {
            return entry(passphrase.clone(), passphrase.clone());
        }

        let prompts: Vec<String> = match &purpose {
            PromptPurpose::Share => vec!["Passphrase: ".into(), "Confirm passphrase: ".into()],
            PromptPurpose::Open { hint: Some(hint) } => {
                vec![format!("Passphrase (hint: {}): ", hint)]
            }
            PromptPurpose::Open { hint: None } => vec!["Passphrase: ".into()],
        };

        let answers = tokio::task::spawn_blocking(move || read_lines(&prompts)).await;
        match answers {
            Ok(Some(mut lines)) => {
                let passphrase = lines.remove(0);
                let confirmed = lines.pop().unwrap_or_else(|| passphrase.clone());
                entry(passphrase, confirmed)
            }
            _ => PassphrasePrompt::Cancelled,
        }
    }
}

fn read_lines(prompts: &[String]) -> Option<Vec<String>> {
    let stdin = io::stdin();
    let mut lines = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        eprint!("{}", prompt);
        let _ = io::stderr().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).ok()? == 0 {
            return None;
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if line.is_empty() {
            return None;
        }
        lines.push(line);
    }
    Some(lines)
}
