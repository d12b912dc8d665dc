//! # Protocol
//!
//! The process-level envelope: one JSON [`Request`] per line in, one JSON [`Response`] per line
//! out. A line that cannot be decoded still gets a `fatal` response, so a client reading
//! responses in lockstep never stalls.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::diagnostics::DriverError;
use crate::driver::{Driver, Mode, Status, DEFAULT_NAME};
use crate::uast::Node;

pub const LANGUAGE: &str = "go";

/// `go-driver:<version>`, reported in every response.
pub fn driver_name() -> String {
    format!("go-driver:{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    #[serde(alias = "ParseAST")]
    Parse,
    Generate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,
    pub content: String,
    /// Falls back to the driver's configured mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    /// The tree to generate from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ast: Option<Node>,
}

impl Request {
    pub fn parse(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn generate(ast: Node, mode: Mode) -> Self {
        Self {
            action: Action::Generate,
            mode: Some(mode),
            ast: Some(ast),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub driver: String,
    pub language: String,
    pub language_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Response {
    fn new(driver: &Driver, status: Status) -> Self {
        Self {
            status,
            errors: Vec::new(),
            driver: driver_name(),
            language: LANGUAGE.to_string(),
            language_version: driver.options().language_version.clone().unwrap_or_default(),
            ast: None,
            content: None,
        }
    }

    pub fn fatal(driver: &Driver, err: &DriverError) -> Self {
        let mut response = Self::new(driver, Status::Fatal);
        response.errors.push(err.to_string());
        response
    }
}

impl Driver {
    /// Answers one request.
    pub fn handle(&self, request: Request) -> Response {
        let mode = request.mode.unwrap_or_else(|| self.mode());
        let mut response = Response::new(self, Status::Ok);
        if let Some(version) = request.language_version {
            response.language_version = version;
        }
        match request.action {
            Action::Parse => {
                let outcome = self.parse(&request.content, mode);
                response.status = outcome.status;
                response.errors = outcome.errors;
                response.ast = outcome.ast;
            }
            Action::Generate => {
                let generated = match &request.ast {
                    Some(ast) => self.generate(ast, mode),
                    None => Err(crate::driver_err!(Protocol, "generate request without an ast")),
                };
                match generated {
                    Ok(content) => response.content = Some(content),
                    Err(err) => {
                        error!(kind = err.kind().as_str(), "generate failed: {}", err);
                        response.status = Status::Fatal;
                        response.errors.push(err.to_string());
                    }
                }
            }
        }
        response
    }

    /// Decodes and answers one request line.
    pub fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(err) => {
                let err = DriverError::from(err);
                error!("malformed request: {}", err);
                Response::fatal(self, &err)
            }
        }
    }

    /// Serves line-delimited requests until `input` is exhausted. Returns how many were answered.
    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<usize, DriverError> {
        let mut answered = 0;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            serde_json::to_writer(&mut output, &response)?;
            output.write_all(b"\n")?;
            output.flush()?;
            answered += 1;
            debug!(answered, status = ?response.status, "answered request");
        }
        Ok(answered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_parse() {
        let request: Request = serde_json::from_str(r#"{"content": "package p"}"#).expect("decode");
        assert_eq!(request.action, Action::Parse);
        assert_eq!(request.mode, None);

        let legacy: Request =
            serde_json::from_str(r#"{"action": "ParseAST", "content": ""}"#).expect("decode");
        assert_eq!(legacy.action, Action::Parse);
    }

    #[test]
    fn test_response_envelope() {
        let driver = Driver::default();
        let response = driver.handle(Request::parse("package p"));
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.language, "go");
        assert!(response.driver.starts_with("go-driver:"));
        assert!(response.ast.is_some());

        let json = serde_json::to_value(&response).expect("encode");
        assert!(json.get("errors").is_none());
        assert!(json.get("content").is_none());
    }

    #[test]
    fn test_generate_without_ast_is_fatal() {
        let driver = Driver::default();
        let request = Request {
            action: Action::Generate,
            ..Request::default()
        };
        let response = driver.handle(request);
        assert_eq!(response.status, Status::Fatal);
        assert_eq!(response.errors.len(), 1);
    }

    #[test]
    fn test_serve_answers_every_line() {
        let driver = Driver::default();
        let input = "{\"content\": \"package a\"}\n\nnot json\n{\"content\": \"package b\"}\n";
        let mut out = Vec::new();
        let answered = driver.serve(input.as_bytes(), &mut out).expect("serve");
        assert_eq!(answered, 3);

        let text = String::from_utf8(out).expect("utf8");
        let statuses: Vec<Status> = text
            .lines()
            .map(|l| serde_json::from_str::<Response>(l).expect("response").status)
            .collect();
        assert_eq!(statuses, vec![Status::Ok, Status::Fatal, Status::Ok]);
    }
}
