//! Translator (or grammar corrector) behind a command line: text on stdin, result on
//! stdout. Fits CTranslate2/Marian wrappers and similar offline tools.

use crate::error::{VoiceError, VoiceResult};
use crate::process::{run_with_deadline, DEFAULT_TIMEOUT};
use parley_core::{DeviceResult, Translator};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
    name: String,
    timeout: Duration,
}

impl CommandTranslator {
    /// `command` is the program followed by its arguments.
    pub fn new(command: &[String]) -> VoiceResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| VoiceError::Config("empty translator command".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            name: command.join(" "),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Kill the process if it has not answered within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, text: &str) -> VoiceResult<String> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let input = format!("{}\n", text);
        let output = run_with_deadline(
            &mut command,
            input.as_bytes(),
            self.timeout,
            VoiceError::Translation,
        )?;
        if !output.status.success() {
            return Err(VoiceError::Translation(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Translator for CommandTranslator {
    fn translate(&self, text: &str) -> DeviceResult<String> {
        Ok(self.run(text)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
