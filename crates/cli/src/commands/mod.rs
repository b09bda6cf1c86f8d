pub mod analyze;
pub mod config;

use serde::Serialize;

/// Invalid or unreadable configuration.
pub const EXIT_CONFIG: u8 = 2;
/// Missing or malformed input CSV.
pub const EXIT_INPUT: u8 = 3;

/// What a command prints to stdout and the process exit code.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    command: &'a str,
    status: &'static str,
    error_class: &'a str,
    message: &'a str,
}

impl CommandResult {
    pub fn document(output: String) -> Self {
        Self { exit_code: 0, output }
    }

    /// A one-line JSON error envelope.
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let message = message.into();
        let envelope = ErrorEnvelope { command, status: "error", error_class, message: &message };
        let output = serde_json::to_string(&envelope).unwrap_or_else(|error| {
            let detail = error.to_string().replace('\\', "\\\\").replace('"', "\\\"");
            format!(
                "{{\"command\":\"{command}\",\"status\":\"error\",\
                 \"error_class\":\"serialization\",\"message\":\"{detail}\"}}"
            )
        });
        Self { exit_code, output }
    }
}
