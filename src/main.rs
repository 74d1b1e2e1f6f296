// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `lgtv-bridge`: runs the serial to MQTT bridge from a TOML file.
//!
//! ```text
//! lgtv-bridge [CONFIG]
//! ```
//!
//! The configuration path is taken from the first argument, then from
//! `LGTV_BRIDGE_CONFIG`, then defaults to `lgtv-bridge.toml`. Log output is
//! controlled with `RUST_LOG`.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use lgtv_bridge::BridgeConfig;
use lgtv_bridge::bridge::Bridge;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "LGTV_BRIDGE_CONFIG";
const DEFAULT_CONFIG: &str = "lgtv-bridge.toml";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    setup_logging_env();

    let path = config_path();
    let config = BridgeConfig::load(&path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", path.display()))?;

    let serial = config.serial_config();
    info!(port = %serial.path, baud_rate = serial.baud_rate, "Opening serial link");
    let device = config
        .device_builder()
        .open_serial(&serial)
        .wrap_err("Failed to open the TV serial link")?;

    let (bus, inbound) = config
        .bus_builder()
        .build()
        .wrap_err("Failed to create the MQTT client")?;

    let bridge = Bridge::new(Arc::new(device), bus);
    tokio::select! {
        () = bridge.run(inbound) => {}
        result = tokio::signal::ctrl_c() => {
            result.wrap_err("Failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
    }

    if let Err(e) = bridge.shutdown().await {
        tracing::warn!(error = %e, "Failed to publish Offline before disconnecting");
    }
    Ok(())
}

fn setup_logging_env() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();
}

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV))
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from)
}
