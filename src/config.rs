use std::env::{self, VarError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{config_error, Error};

const DEFAULT_DATABASE: &str = "mellmap.db";
const DEFAULT_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct Config {
    pub database: PathBuf,
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub max_connections: u32,
}

impl Config {
    /// Reads the service configuration from `MELLMAP_*` environment variables,
    /// falling back to defaults for any variable that is not set.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let database = optional(&lookup, "MELLMAP_DATABASE")?
            .unwrap_or_else(|| DEFAULT_DATABASE.into());
        let addr = optional(&lookup, "MELLMAP_ADDR")?.unwrap_or_else(|| DEFAULT_ADDR.into());
        let static_dir = optional(&lookup, "MELLMAP_STATIC_DIR")?
            .unwrap_or_else(|| DEFAULT_STATIC_DIR.into());
        let max_connections = match optional(&lookup, "MELLMAP_MAX_CONNECTIONS")? {
            Some(value) => parse("MELLMAP_MAX_CONNECTIONS", &value)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database: database.into(),
            addr: parse("MELLMAP_ADDR", &addr)?,
            static_dir: static_dir.into(),
            max_connections,
        })
    }
}

fn optional<F>(lookup: &F, name: &str) -> Result<Option<String>, Error>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T, Error> {
    value.trim().parse().map_err(|_| {
        tracing::error!(variable = name, value, "unparseable configuration value");
        config_error(name)
    })
}

#[test]
fn defaults_apply_when_unset() {
    let config = Config::from_lookup(|_| Err(VarError::NotPresent)).unwrap();

    assert_eq!(config.database, PathBuf::from("mellmap.db"));
    assert_eq!(config.addr, "0.0.0.0:5000".parse().unwrap());
    assert_eq!(config.static_dir, PathBuf::from("static"));
    assert_eq!(config.max_connections, 5);
}

#[test]
fn overrides_are_read() {
    let config = Config::from_lookup(|name| match name {
        "MELLMAP_DATABASE" => Ok("/tmp/places.db".into()),
        "MELLMAP_ADDR" => Ok("127.0.0.1:8080".into()),
        "MELLMAP_MAX_CONNECTIONS" => Ok("1".into()),
        _ => Err(VarError::NotPresent),
    })
    .unwrap();

    assert_eq!(config.database, PathBuf::from("/tmp/places.db"));
    assert_eq!(config.addr.port(), 8080);
    assert_eq!(config.max_connections, 1);
}

#[test]
fn bad_address_is_rejected() {
    let result = Config::from_lookup(|name| match name {
        "MELLMAP_ADDR" => Ok("localhost".into()),
        _ => Err(VarError::NotPresent),
    });

    assert_eq!(result.unwrap_err().code, 3);
}
