// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process;

use relational_chat_server::{config::IdentityConfig, logging, server::run_identity};

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init("identity-server") {
        eprintln!("failed to initialise logging: {e}");
        process::exit(1);
    }

    let config = match IdentityConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            process::exit(2);
        }
    };

    if let Err(e) = run_identity(config).await {
        tracing::error!(error = %e, "identity-server failed");
        process::exit(1);
    }
}
