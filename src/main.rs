use clap::{clap_app, ArgMatches};
use dotenv::dotenv;
use log::error;
use shadow_rs::shadow;
use std::env;
use std::process::exit;
use std::str::FromStr;

use config::{AddConfig, ServerConfig};
use error::{Error, Result};

shadow!(build);

mod command;
mod config;
mod error;
mod model;
mod server;
mod templates;

fn main() {
    dotenv().ok();

    if shadow_rs::is_debug() {
        pretty_env_logger::init();
    } else {
        env_logger::init();
    }

    let matches = clap_app!(quill =>
        (version: build::PKG_VERSION)
        (about: "A minimal blogging service")
        (@subcommand run =>
            (about: "run the server")
            (@arg PORT: -p --port +takes_value "http port, defaults to 5000")
            (@arg ASYNC_THREADS: --async +takes_value "number of asyncronous worker threads used handling io, defaults to 2")
            (@arg AUTH_THREADS: --auth +takes_value "number of threads used to verify passwords, defaults to 4")
            (@arg SYNC_THREADS: --sync +takes_value "number of max sync worker, defaults to 128")
            (@arg CONNECTION: -c --connection +takes_value "sqlite connection string, defaults to 'sqlite::memory:'")
        )
        (@subcommand add =>
            (about: "add a dashboard user to the database")
            (@arg USER: -u --user +takes_value +required "username of the new user")
            (@arg PASSWORD: --password +takes_value +required "password of the new user")
            (@arg CONNECTION: -c --connection +takes_value "sqlite connection string, defaults to 'sqlite::memory:'")
        )
    )
    .get_matches();

    let result = match matches.subcommand() {
        ("run", matches) => run_server(matches),
        ("add", matches) => run_add(matches),
        _ => Err(Error::InvalidCommand),
    };

    if let Err(e) = result {
        error!("{}", e);
        exit(1);
    }
}

/// CLI flag wins over environment variable; values that fail to parse are
/// ignored and the default stays in place.
fn setting<T: FromStr>(matches: Option<&ArgMatches>, arg: &str, env_key: &str) -> Option<T> {
    matches
        .and_then(|m| m.value_of(arg))
        .and_then(|s| T::from_str(s).ok())
        .or_else(|| env::var(env_key).ok().and_then(|s| T::from_str(&s).ok()))
}

fn run_server(matches: Option<&ArgMatches>) -> Result<()> {
    let mut config = ServerConfig::default();

    if let Some(conn) = setting::<String>(matches, "CONNECTION", "QUILL_CONNECTION") {
        config.db_conn = conn;
    }

    if let Some(port) = setting::<u16>(matches, "PORT", "QUILL_PORT") {
        config.port = port;
    }

    if let Some(async_threads) = setting::<usize>(matches, "ASYNC_THREADS", "QUILL_ASYNC_THREADS") {
        config.async_threads = async_threads;
    }

    if let Some(auth_threads) = setting::<usize>(matches, "AUTH_THREADS", "QUILL_AUTH_THREADS") {
        config.auth_threads = auth_threads;
    }

    if let Some(sync_threads) = setting::<usize>(matches, "SYNC_THREADS", "QUILL_SYNC_THREADS") {
        config.blocking_threads = sync_threads;
    }

    command::run(&config)
}

fn run_add(matches: Option<&ArgMatches>) -> Result<()> {
    let mut db_conn = ServerConfig::default().db_conn;

    if let Some(conn) = setting::<String>(matches, "CONNECTION", "QUILL_CONNECTION") {
        db_conn = conn;
    }

    let matches = matches.ok_or(Error::InvalidCommand)?;

    let config = AddConfig {
        db_conn,
        username: matches
            .value_of("USER")
            .ok_or(Error::InvalidCommand)?
            .to_string(),
        password: matches
            .value_of("PASSWORD")
            .ok_or(Error::InvalidCommand)?
            .to_string(),
    };

    command::add_user(&config)
}
