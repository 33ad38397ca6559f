//! Local runner: newline-delimited JSON invocations on stdin, one JSON
//! response per line on stdout.
//!
//! ```text
//! {"credential_file": "certs/factory.pem", "function": "create", "args": ["VIN1"]}
//! ```
//!
//! Logs go to stderr.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use carchain_auth::X509IdentityResolver;
use carchain_contract::{CarContract, Invocation, LocalRuntime, Response, StatusClass};
use carchain_infra::config::ContractConfig;
use carchain_observability::Logger;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    /// Credential of the caller; omitted means an empty credential.
    #[serde(default)]
    credential_file: Option<PathBuf>,
    function: String,
    #[serde(default)]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let logger = Logger::from_env();
    let config = ContractConfig::from_env(&logger)?;
    let contract = CarContract::with_x509(config, logger.clone());
    let runtime = LocalRuntime::new(contract, logger.clone());

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = handle(&runtime, &line).unwrap_or_else(|err| {
            Response::error(StatusClass::ClientError, format!("line {}: {err:#}", index + 1))
        });
        writeln!(stdout, "{}", response.to_json()).context("failed to write response")?;
    }

    Ok(())
}

fn handle(runtime: &LocalRuntime<X509IdentityResolver>, line: &str) -> anyhow::Result<Response> {
    let request: Request = serde_json::from_str(line).context("malformed request")?;
    let creator = match &request.credential_file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read credential {}", path.display()))?,
        None => Vec::new(),
    };

    if request.function == "init" {
        return Ok(runtime.instantiate(creator));
    }
    let invocation = Invocation::new(request.function, request.args);
    Ok(runtime.submit(creator, &invocation))
}
