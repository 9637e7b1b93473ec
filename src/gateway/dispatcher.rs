//! Request dispatcher
//!
//! Authenticates the caller, validates the action, resolves any path, runs
//! the action and shapes the response. It only ever sees the flat
//! [`RequestParams`] record; transport handling happens before it.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::params::{RequestParams, Transport};
use super::response::ApiResponse;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sandbox::{Action, ActionCall, ActionExecutor, ActionOutcome, SandboxRoot};

/// Maps an authenticated request to an action outcome and HTTP response
pub struct Dispatcher {
    secret: SecretString,
    executor: Arc<ActionExecutor>,
}

impl Dispatcher {
    /// Create a dispatcher guarding `executor` with `secret`
    pub fn new(secret: SecretString, executor: ActionExecutor) -> Result<Self> {
        if secret.expose_secret().is_empty() {
            return Err(Error::Config("SECRET_TOKEN must not be empty".to_string()));
        }
        Ok(Dispatcher {
            secret,
            executor: Arc::new(executor),
        })
    }

    /// Create a dispatcher from validated configuration
    pub fn from_config(config: &Config, root: SandboxRoot) -> Result<Self> {
        let secret = config
            .auth
            .secret_token
            .clone()
            .ok_or_else(|| Error::Config("SECRET_TOKEN must be set".to_string()))?;
        Self::new(secret, ActionExecutor::new(root, config.shell.clone()))
    }

    /// The sandbox root
    pub fn root(&self) -> &SandboxRoot {
        self.executor.root()
    }

    /// Constant-time comparison of the caller token against the secret
    pub fn authenticate(&self, token: Option<&str>) -> bool {
        let Some(token) = token else {
            return false;
        };
        token
            .as_bytes()
            .ct_eq(self.secret.expose_secret().as_bytes())
            .into()
    }

    /// Handle one request
    pub async fn handle(&self, params: RequestParams) -> ApiResponse {
        if !self.authenticate(params.token.as_deref()) {
            warn!("Rejected request with invalid token");
            return ApiResponse::from_error(&Error::Forbidden);
        }

        let Some(name) = params.action.as_deref().filter(|a| !a.is_empty()) else {
            return ApiResponse::from_error(&Error::BadRequest("Action required".to_string()));
        };

        let action = match name.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                warn!(action = %name, "Rejected unknown action");
                return ApiResponse::from_error(&e);
            }
        };

        let span = info_span!("request", request_id = %Uuid::new_v4(), %action);
        self.dispatch(action, params).instrument(span).await
    }

    async fn dispatch(&self, action: Action, params: RequestParams) -> ApiResponse {
        let result = match self.prepare_call(action, &params) {
            Ok(call) => self.execute(call).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                info!("Action completed");
                shape(outcome, &params)
            }
            Err(e) => {
                match &e {
                    Error::AccessDenied(_) => warn!(path = ?params.path, "{}", e),
                    _ => error!("Action failed: {}", e),
                }
                ApiResponse::from_error(&e)
            }
        }
    }

    /// Resolve parameters into a validated call
    fn prepare_call(&self, action: Action, params: &RequestParams) -> Result<ActionCall> {
        let root = self.executor.root();
        let call = match action {
            Action::WriteFile => ActionCall::WriteFile {
                path: root.resolve(params.path.as_deref())?,
                content: params.content.clone().unwrap_or_default(),
            },
            Action::ReadFile => ActionCall::ReadFile {
                path: root.resolve(params.path.as_deref())?,
            },
            Action::ListDir => ActionCall::ListDir {
                path: root.resolve(params.path.as_deref())?,
            },
            Action::Shell => ActionCall::Shell {
                command: params.command.clone().unwrap_or_default(),
            },
        };
        Ok(call)
    }

    /// Run the call on its own task so a dropped connection cannot cancel it
    async fn execute(&self, call: ActionCall) -> Result<ActionOutcome> {
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move { executor.run(call).await }.in_current_span())
            .await
            .map_err(|e| Error::Internal(format!("Action task failed: {}", e)))?
    }
}

fn shape(outcome: ActionOutcome, params: &RequestParams) -> ApiResponse {
    match outcome {
        ActionOutcome::Written { bytes } => ApiResponse::written(params.path.as_deref(), bytes),
        ActionOutcome::Read { content } => match params.transport {
            Transport::Query => ApiResponse::Text(content),
            Transport::Body => ApiResponse::read_json(content),
        },
        ActionOutcome::Listed { files } => ApiResponse::listed(files),
        ActionOutcome::Shell(output) => ApiResponse::shell(&output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use axum::http::StatusCode;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    const SECRET: &str = "s3cret";

    async fn dispatcher() -> (TempDir, Dispatcher) {
        let dir = tempdir().unwrap();
        let root = SandboxRoot::prepare(&dir.path().join("sandbox")).await.unwrap();
        let executor = ActionExecutor::new(root, ShellConfig::default());
        let dispatcher = Dispatcher::new(SecretString::from(SECRET), executor).unwrap();
        (dir, dispatcher)
    }

    fn params(action: &str) -> RequestParams {
        RequestParams {
            token: Some(SECRET.to_string()),
            action: Some(action.to_string()),
            ..RequestParams::default()
        }
    }

    #[test]
    fn test_empty_secret_rejected() {
        let root = SandboxRoot::new(std::env::temp_dir()).unwrap();
        let executor = ActionExecutor::new(root, ShellConfig::default());
        assert!(Dispatcher::new(SecretString::from(""), executor).is_err());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (_dir, dispatcher) = dispatcher().await;
        assert!(dispatcher.authenticate(Some(SECRET)));
        assert!(!dispatcher.authenticate(Some("s3cre")));
        assert!(!dispatcher.authenticate(Some("s3cret!")));
        assert!(!dispatcher.authenticate(Some("")));
        assert!(!dispatcher.authenticate(None));
    }

    #[tokio::test]
    async fn test_bad_token_has_no_side_effects() {
        let (_dir, dispatcher) = dispatcher().await;

        for action in ["write_file", "read_file", "list_dir", "shell", "bogus"] {
            let mut request = params(action);
            request.token = Some("wrong".to_string());
            request.path = Some("pwned.txt".to_string());
            request.content = Some("x".to_string());
            request.command = Some("touch shell-ran".to_string());

            let response = dispatcher.handle(request).await;
            assert_eq!(
                response,
                ApiResponse::error(StatusCode::FORBIDDEN, "Forbidden")
            );
        }

        let entries = std::fs::read_dir(dispatcher.root().path()).unwrap().count();
        assert_eq!(entries, 0);
    }

    #[tokio::test]
    async fn test_missing_token_is_forbidden() {
        let (_dir, dispatcher) = dispatcher().await;
        let mut request = params("list_dir");
        request.token = None;
        assert_eq!(
            dispatcher.handle(request).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_action_required() {
        let (_dir, dispatcher) = dispatcher().await;

        for action in [None, Some(String::new())] {
            let request = RequestParams {
                token: Some(SECRET.to_string()),
                action,
                ..RequestParams::default()
            };
            assert_eq!(
                dispatcher.handle(request).await,
                ApiResponse::error(StatusCode::BAD_REQUEST, "Action required")
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_action() {
        let (_dir, dispatcher) = dispatcher().await;
        assert_eq!(
            dispatcher.handle(params("delete_everything")).await,
            ApiResponse::error(StatusCode::BAD_REQUEST, "Invalid action")
        );
    }

    #[tokio::test]
    async fn test_write_then_read_by_transport() {
        let (_dir, dispatcher) = dispatcher().await;

        let mut write = params("write_file");
        write.path = Some("a/b.txt".to_string());
        write.content = Some("hello".to_string());
        let response = dispatcher.handle(write).await;
        assert_eq!(
            response,
            ApiResponse::Json {
                status: StatusCode::OK,
                body: json!({
                    "success": true,
                    "message": "File written to a/b.txt",
                    "contentLength": 5,
                }),
            }
        );
        let on_disk = std::fs::read_to_string(dispatcher.root().path().join("a/b.txt")).unwrap();
        assert_eq!(on_disk, "hello");

        let mut read = params("read_file");
        read.path = Some("a/b.txt".to_string());
        assert_eq!(
            dispatcher.handle(read.clone()).await,
            ApiResponse::Text("hello".to_string())
        );

        read.transport = Transport::Body;
        assert_eq!(
            dispatcher.handle(read).await,
            ApiResponse::Json {
                status: StatusCode::OK,
                body: json!({ "success": true, "content": "hello" }),
            }
        );
    }

    #[tokio::test]
    async fn test_write_without_content_writes_empty_file() {
        let (_dir, dispatcher) = dispatcher().await;
        let mut write = params("write_file");
        write.path = Some("empty.txt".to_string());

        let response = dispatcher.handle(write).await;
        assert_eq!(response.status(), StatusCode::OK);
        let on_disk = std::fs::read_to_string(dispatcher.root().path().join("empty.txt")).unwrap();
        assert!(on_disk.is_empty());
    }

    #[tokio::test]
    async fn test_escape_attempt_stays_inside() {
        let (_dir, dispatcher) = dispatcher().await;
        let mut read = params("read_file");
        read.path = Some("../../etc/passwd".to_string());

        // Re-rooted to <sandbox>/etc/passwd, which does not exist
        let response = dispatcher.handle(read).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_write_escape_lands_inside_sandbox() {
        let (dir, dispatcher) = dispatcher().await;
        let mut write = params("write_file");
        write.path = Some("../outside.txt".to_string());
        write.content = Some("x".to_string());

        assert_eq!(dispatcher.handle(write).await.status(), StatusCode::OK);
        assert!(!dir.path().join("outside.txt").exists());
        assert!(dispatcher.root().path().join("outside.txt").exists());
    }

    #[tokio::test]
    async fn test_list_dir_fresh_sandbox() {
        let (_dir, dispatcher) = dispatcher().await;
        assert_eq!(
            dispatcher.handle(params("list_dir")).await,
            ApiResponse::Json {
                status: StatusCode::OK,
                body: json!({ "success": true, "files": [] }),
            }
        );
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_internal_error() {
        let (_dir, dispatcher) = dispatcher().await;
        let mut list = params("list_dir");
        list.path = Some("nope".to_string());

        let response = dispatcher.handle(list).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_reports_output() {
        let (_dir, dispatcher) = dispatcher().await;
        let mut shell = params("shell");
        shell.command = Some("echo hi".to_string());

        let ApiResponse::Json { status, body } = dispatcher.handle(shell).await else {
            panic!("expected JSON");
        };
        assert_eq!(status, StatusCode::OK);
        assert!(body["stdout"].as_str().unwrap().contains("hi"));
        assert!(body["error"].is_null());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_nonzero_exit_is_ok() {
        let (_dir, dispatcher) = dispatcher().await;
        let mut shell = params("shell");
        shell.command = Some("exit 7".to_string());

        let ApiResponse::Json { status, body } = dispatcher.handle(shell).await else {
            panic!("expected JSON");
        };
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].is_null());
        assert_eq!(body["exitCode"], 7);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runs_in_sandbox_root() {
        let (_dir, dispatcher) = dispatcher().await;
        let mut shell = params("shell");
        shell.command = Some("pwd".to_string());

        let ApiResponse::Json { body, .. } = dispatcher.handle(shell).await else {
            panic!("expected JSON");
        };
        let pwd = body["stdout"].as_str().unwrap().trim().to_string();
        assert_eq!(std::path::Path::new(&pwd), dispatcher.root().path());
    }
}
