// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use std::io;
use std::net::TcpListener;
use std::path::Path;
use std::rc::Rc;

use actix::Actor;
use actix_web::{middleware, web, App, HttpServer};
use clap::{arg, Command};
use log::info;

use ds_intg::api::{Apartment, ApiClient};
use ds_intg::configuration::{get_configuration, DEF_CONFIG_FILE, ENV_APP_TOKEN};
use ds_intg::hub::EntityRegistry;
use ds_intg::sensor::discover_sensors;
use ds_intg::startup::{built_info, APP_VERSION};
use ds_intg::{server, Controller};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let args = Command::new(built_info::PKG_NAME)
        .author("Jens Obermayer")
        .version(APP_VERSION)
        .about("digitalSTROM metering and sensor integration daemon")
        .arg(arg!(-c --config <FILE> "Configuration file").required(false))
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config") {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {DEF_CONFIG_FILE}");
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c.as_str()),
    };
    let cfg = get_configuration(cfg_file).expect("Failed to read configuration");

    if cfg.dss.get_token().is_empty() {
        eprintln!(
            "Missing dSS application token: set dss.app_token in the configuration file or {ENV_APP_TOKEN}"
        );
        std::process::exit(1);
    }

    let listener = if cfg.integration.http.enabled {
        let address = format!(
            "{}:{}",
            cfg.integration.interface, cfg.integration.http.port
        );
        println!("{} listening on: {}", built_info::PKG_NAME, address);
        Some(TcpListener::bind(address)?)
    } else {
        None
    };

    let api = ApiClient::new(&cfg.dss).map_err(|e| io::Error::other(e.to_string()))?;

    // The apartment structure is required to know which entities exist.
    // Later read or notification failures are retried, this one is fatal.
    let apartment = Apartment::fetch(&api)
        .await
        .map(Rc::new)
        .map_err(|e| io::Error::other(format!("Failed to read apartment structure: {e}")))?;
    let discovered = discover_sensors(&apartment, &api).await;

    let registry = EntityRegistry::new().start();
    let _controller = Controller::new(
        cfg.dss.clone(),
        api,
        apartment,
        discovered,
        registry.clone(),
    )
    .start();

    if let Some(listener) = listener {
        let registry_data = web::Data::new(registry);

        HttpServer::new(move || {
            App::new()
                .wrap(middleware::Logger::default())
                .app_data(registry_data.clone())
                .service(server::status)
                .service(server::entities)
        })
        .workers(1)
        .listen(listener)?
        .run()
        .await?;
    } else {
        info!("HTTP API disabled");
        futures::future::pending::<()>().await;
    }

    Ok(())
}
