// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! dSS smart-meter API connection test tool.
//!
//! Reads the apartment structure and the meterings list, then performs one
//! poll over every discovered metering channel and prints the raw values.

use std::str::FromStr;

use anyhow::anyhow;
use clap::{Arg, Command};
use url::Url;

use ds_intg::api::channel::ModbusMeterChannel;
use ds_intg::api::meterings::fetch_meterings;
use ds_intg::api::{Apartment, ApiClient};
use ds_intg::configuration::{get_configuration, Settings, DEF_DSS_URL};
use ds_intg::APP_VERSION;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cfg = parse_args_load_cfg()?;

    let api = ApiClient::new(&cfg.dss).map_err(|e| anyhow!("{e}"))?;

    println!("Reading apartment structure from {} ...", cfg.dss.get_url());
    let apartment = Apartment::fetch(&api).await.map_err(|e| anyhow!("{e}"))?;

    println!("Circuit meters:");
    for channel in apartment.circuit_channels() {
        let circuit = channel.circuit();
        let presence = if circuit.available { "" } else { " (absent)" };
        match channel.read(&api).await {
            Ok(value) => println!(
                "  {} [{}]{presence} = {value}",
                circuit.name,
                channel.kind().key()
            ),
            Err(e) => println!(
                "  {} [{}]{presence} read failed: {e}",
                circuit.name,
                channel.kind().key()
            ),
        }
    }

    println!("Device sensors:");
    for channel in apartment.sensor_channels() {
        println!(
            "  {}_S{} type={} value={:?}",
            channel.device().dsuid,
            channel.index(),
            channel.sensor_type(),
            channel.last_value()
        );
    }

    println!("Modbus meterings:");
    match fetch_meterings(&api).await {
        Ok(specs) if specs.is_empty() => println!("  none"),
        Ok(specs) => {
            for spec in specs {
                let channel = ModbusMeterChannel::new(spec);
                let spec = channel.spec();
                match channel.read(&api).await {
                    Ok(value) => println!(
                        "  {} [{}] {} = {value} {}",
                        spec.metering_id,
                        spec.kind.key(),
                        spec.technical_name,
                        spec.unit
                    ),
                    Err(e) => println!(
                        "  {} [{}] {} read failed: {e}",
                        spec.metering_id,
                        spec.kind.key(),
                        spec.technical_name
                    ),
                }
            }
        }
        Err(e) => println!("  query failed: {e}"),
    }

    Ok(())
}

fn parse_args_load_cfg() -> anyhow::Result<Settings> {
    let args = Command::new("ds-apitest")
        .author("Jens Obermayer")
        .version(APP_VERSION)
        .about("dSS smart-meter API communication test")
        .arg(
            Arg::new("url")
                .short('u')
                .default_value(DEF_DSS_URL)
                .help("dSS API base URL (overrides ds-intg.yaml)"),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .help("dSS application token (overrides ds-intg.yaml)"),
        )
        .arg(
            Arg::new("connection_timeout")
                .short('c')
                .help("TCP connection timeout in seconds (overrides ds-intg.yaml)"),
        )
        .arg(
            Arg::new("request_timeout")
                .short('r')
                .help("Request timeout in seconds (overrides ds-intg.yaml)"),
        )
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let cfg_file = None;
    let mut cfg = get_configuration(cfg_file).expect("Failed to read configuration");
    if let Some(url) = args.get_one::<String>("url") {
        cfg.dss.set_url(Url::parse(url)?);
    }
    if let Some(token) = args.get_one::<String>("token") {
        cfg.dss.set_token(token);
    }
    if let Some(timeout) = args.get_one::<String>("connection_timeout") {
        cfg.dss.connection_timeout = u8::from_str(timeout)?;
    }
    if let Some(timeout) = args.get_one::<String>("request_timeout") {
        cfg.dss.request_timeout = u8::from_str(timeout)?;
    }

    if !cfg.dss.get_url().has_host() || cfg.dss.get_token().is_empty() {
        eprintln!("Can't connect to dSS: URL or application token is missing");
        std::process::exit(1);
    }

    Ok(cfg)
}
