const CLI_ERROR_CODE_JSON: &str = "json";
const CLI_ERROR_CODE_USAGE: &str = "usage";
const CLI_ERROR_CODE_STDOUT: &str = "stdout";

#[derive(Debug)]
pub(crate) enum CliError {
    Tool(safe_rewrite::Error),
    Json(serde_json::Error),
    Usage(String),
    Stdout(std::io::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Tool(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "json error: {err}"),
            CliError::Usage(message) => write!(f, "usage error: {message}"),
            CliError::Stdout(err) => write!(f, "failed to write to stdout: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Tool(err) => Some(err),
            CliError::Json(err) => Some(err),
            CliError::Usage(_) => None,
            CliError::Stdout(err) => Some(err),
        }
    }
}

impl From<safe_rewrite::Error> for CliError {
    fn from(err: safe_rewrite::Error) -> Self {
        Self::Tool(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl CliError {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            CliError::Tool(err) => err.code(),
            CliError::Json(_) => CLI_ERROR_CODE_JSON,
            CliError::Usage(_) => CLI_ERROR_CODE_USAGE,
            CliError::Stdout(_) => CLI_ERROR_CODE_STDOUT,
        }
    }
}

fn step_failures_json(failures: &[safe_rewrite::StepFailure]) -> serde_json::Value {
    serde_json::Value::Array(
        failures
            .iter()
            .map(|failure| {
                serde_json::json!({
                    "op": failure.op,
                    "message": failure.source.to_string(),
                })
            })
            .collect(),
    )
}

pub(crate) fn tool_error_details(tool: &safe_rewrite::Error) -> Option<serde_json::Value> {
    match tool {
        safe_rewrite::Error::OpenFailed { path, source } => Some(serde_json::json!({
            "kind": "open_failed",
            "path": path.display().to_string(),
            "message": source.to_string(),
        })),
        safe_rewrite::Error::TempCreateFailed { path, source } => Some(serde_json::json!({
            "kind": "temp_create_failed",
            "path": path.display().to_string(),
            "message": source.to_string(),
        })),
        safe_rewrite::Error::IoPath { op, path, .. } => Some(serde_json::json!({
            "kind": "io_path",
            "op": op,
            "path": path.display().to_string(),
        })),
        safe_rewrite::Error::CommitFailed {
            path,
            temp_path,
            source,
            earlier,
        } => Some(serde_json::json!({
            "kind": "commit_failed",
            "path": path.display().to_string(),
            "temp_path": temp_path.display().to_string(),
            "message": source.to_string(),
            "earlier": step_failures_json(earlier),
        })),
        safe_rewrite::Error::CloseIncomplete { path, failures } => Some(serde_json::json!({
            "kind": "close_incomplete",
            "path": path.display().to_string(),
            "failures": step_failures_json(failures),
        })),
        safe_rewrite::Error::AbortFailed { op, path, source } => Some(serde_json::json!({
            "kind": "abort_failed",
            "op": op,
            "path": path.display().to_string(),
            "message": source.to_string(),
        })),
        safe_rewrite::Error::AlreadyClosed { path, state } => Some(serde_json::json!({
            "kind": "already_closed",
            "path": path.display().to_string(),
            "state": state.as_str(),
        })),
        safe_rewrite::Error::InvalidPath(message) => Some(serde_json::json!({
            "kind": "invalid_path",
            "message": message,
        })),
        safe_rewrite::Error::InvalidOptions(message) => Some(serde_json::json!({
            "kind": "invalid_options",
            "message": message,
        })),
        safe_rewrite::Error::InputTooLarge {
            size_bytes,
            max_bytes,
        } => Some(serde_json::json!({
            "kind": "input_too_large",
            "size_bytes": size_bytes,
            "max_bytes": max_bytes,
        })),
        safe_rewrite::Error::Transform {
            path,
            source,
            abort_error,
        } => Some(serde_json::json!({
            "kind": "transform",
            "path": path.display().to_string(),
            "message": source.to_string(),
            "abort_error": abort_error.as_ref().map(|err| err.to_string()),
        })),
    }
}

pub(crate) fn error_json(err: &CliError) -> serde_json::Value {
    let mut error = serde_json::Map::new();
    error.insert(
        "code".to_string(),
        serde_json::Value::String(err.code().to_string()),
    );
    error.insert(
        "message".to_string(),
        serde_json::Value::String(err.to_string()),
    );
    if let CliError::Tool(tool) = err {
        if let Some(details) = tool_error_details(tool) {
            error.insert("details".to_string(), details);
        }
    }
    serde_json::json!({ "error": error })
}
