use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Abstract interface for an AI CLI Client (e.g., gemini, claude).
#[async_trait]
pub trait AiCliClient: Send + Sync {
    /// Sends a prompt to the AI and returns the response.
    async fn prompt(&self, prompt_text: &str) -> Result<String>;
}

/// Calls an AI CLI executable (default: gemini) once per prompt.
#[derive(Debug, Clone)]
pub struct ShellCliClient {
    pub executable: String,
    pub model: Option<String>,
    pub debug_ai_cli: bool,
    pub max_retries: u32,
}

impl ShellCliClient {
    pub fn new(executable: &str) -> Self {
        Self {
            executable: executable.to_string(),
            model: None,
            debug_ai_cli: false,
            max_retries: 3,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug_ai_cli = debug;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }
}

fn is_rate_limited(message: &str) -> bool {
    message.contains("exhausted your capacity")
        || message.contains("rate limit")
        || message.contains("quota")
}

#[async_trait]
impl AiCliClient for ShellCliClient {
    async fn prompt(&self, prompt_text: &str) -> Result<String> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.execute_prompt(prompt_text).await {
                Ok(output) => return Ok(output),
                Err(e) => {
                    if is_rate_limited(&e.to_string()) && attempt < self.max_retries {
                        let backoff_secs = 2u64.pow(attempt); // 2s, 4s, 8s
                        tracing::warn!(
                            executable = %self.executable,
                            attempt,
                            max_retries = self.max_retries,
                            backoff_secs,
                            "model rate limited, retrying"
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl ShellCliClient {
    async fn execute_prompt(&self, prompt_text: &str) -> Result<String> {
        let mut cmd = Command::new(&self.executable);
        if let Some(ref m) = self.model {
            cmd.arg("-m").arg(m);
        }
        if self.debug_ai_cli {
            cmd.arg("--debug");
        }
        cmd.arg(prompt_text);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        if self.debug_ai_cli {
            eprintln!(
                "\n{}",
                console::style("--- AI CLI PROMPT ---").bold().yellow()
            );
            eprintln!("Command: {} (model: {:?})", self.executable, self.model);
            eprintln!("Prompt Length: {} chars", prompt_text.len());
            eprintln!(
                "{}\n",
                console::style("----------------------").bold().yellow()
            );
        }

        let output = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.executable))?
            .wait_with_output()
            .await
            .context("Failed to collect AI CLI output")?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if self.debug_ai_cli && !stderr.is_empty() {
            eprintln!("{}", stderr);
        }

        if !output.status.success() {
            // stderr is kept in the message so the retry loop can spot rate limiting
            anyhow::bail!(
                "AI CLI failed with status: {}. Stderr: {}",
                output.status,
                stderr.chars().take(500).collect::<String>()
            );
        }

        tracing::debug!(
            executable = %self.executable,
            bytes = output.stdout.len(),
            "AI CLI succeeded"
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// Exposed for e2e and integration testing
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard};

    type MockResponseAction = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

    /// Replays queued responses in order, then answers `MOCK_RESPONSE`.
    /// Clones share the same queue and prompt log.
    #[derive(Clone, Default)]
    pub struct MockCliClient {
        pub responses: Arc<Mutex<VecDeque<MockResponseAction>>>,
        pub prompts: Arc<Mutex<Vec<String>>>,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    impl MockCliClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_response(&self, response: impl Into<String>) {
            let response = response.into();
            lock(&self.responses).push_back(Box::new(move |_| Ok(response.clone())));
        }

        pub fn add_action<F>(&self, action: F)
        where
            F: Fn(&str) -> Result<String> + Send + Sync + 'static,
        {
            lock(&self.responses).push_back(Box::new(action));
        }

        pub fn add_failure(&self, message: &str) {
            let message = message.to_string();
            self.add_action(move |_| Err(anyhow::anyhow!(message.clone())));
        }

        /// Every prompt received so far, oldest first.
        pub fn prompts(&self) -> Vec<String> {
            lock(&self.prompts).clone()
        }

        pub fn pending(&self) -> usize {
            lock(&self.responses).len()
        }
    }

    #[async_trait]
    impl AiCliClient for MockCliClient {
        async fn prompt(&self, prompt: &str) -> Result<String> {
            lock(&self.prompts).push(prompt.to_string());
            let action_opt = lock(&self.responses).pop_front();

            if let Some(action) = action_opt {
                action(prompt)
            } else {
                Ok("MOCK_RESPONSE".to_string())
            }
        }
    }
}
