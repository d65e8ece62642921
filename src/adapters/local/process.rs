use crate::ports::tools::{ToolInvocation, ToolOutput, ToolRunner};
use std::io;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs tools as child processes and waits for them.
///
/// Tool diagnostics go straight to this process's stderr; only stdout is captured.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    fn invoke(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let output = command.output()?;
        debug!(
            tool = %invocation.name(),
            exit_code = ?output.status.code(),
            "tool exited"
        );

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
