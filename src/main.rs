// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use tenant_gateway::config::Config;
use tenant_gateway::server::{init_tracing, run};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // Logging is not up yet, so configuration errors go to stderr.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(config.log_format) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Tenant gateway failed");
            ExitCode::FAILURE
        }
    }
}
