use std::process::Stdio;

use tokio::process::Command;

use super::{Generation, GenerationError, TextGenerator};

/// Runs an external narrator: `<program> <args...> <prompt>`, narrative on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTextGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandTextGenerator {
    /// Splits a configured command line on whitespace.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl CommandTextGenerator {
    async fn run(&self, prompt: &str) -> Result<String, GenerationError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(prompt)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| GenerationError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(GenerationError::Failed(output.status.to_string()));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|_| GenerationError::Failed("narrative was not valid UTF-8".to_string()))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text.to_string())
    }
}

impl TextGenerator for CommandTextGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> Generation<'a> {
        Box::pin(self.run(prompt))
    }
}
