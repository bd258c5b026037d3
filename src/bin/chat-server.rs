// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process;

use relational_chat_server::{config::ChatConfig, logging, server::run_chat};

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init("chat-server") {
        eprintln!("failed to initialise logging: {e}");
        process::exit(1);
    }

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            process::exit(2);
        }
    };

    if let Err(e) = run_chat(config).await {
        tracing::error!(error = %e, "chat-server failed");
        process::exit(1);
    }
}
