//! Postgres configuration.
use std::{borrow::Cow, env::var, fmt};

use crate::{common::ByteStr, postgres::frontend::Startup};

const DEFAULT_APPLICATION_NAME: &str = "postwire";

/// Postgres connection config.
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) user: ByteStr,
    pub(crate) pass: ByteStr,
    pub(crate) socket: Option<ByteStr>,
    pub(crate) host: ByteStr,
    pub(crate) port: u16,
    pub(crate) dbname: Option<ByteStr>,
    pub(crate) application_name: ByteStr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: ByteStr::from_static("postgres"),
            pass: ByteStr::from_static(""),
            socket: None,
            host: ByteStr::from_static("localhost"),
            port: 5432,
            dbname: None,
            application_name: ByteStr::from_static(DEFAULT_APPLICATION_NAME),
        }
    }
}

impl Config {
    /// Retrieve configuration from environment variable.
    ///
    /// It reads:
    /// - `PGUSER`
    /// - `PGPASSWORD`
    /// - `PGHOST`
    /// - `PGPORT`
    /// - `PGDATABASE`
    /// - `PGAPPNAME`
    ///
    /// Additionally, it also read `DATABASE_URL` to provide missing value from
    /// previous variables before fallback to default value.
    pub fn from_env() -> Config {
        let url = var("DATABASE_URL").ok().and_then(|e| Config::parse_inner(e.into()).ok());
        let def = Config::default();

        macro_rules! env {
            ($name:literal,$field:ident) => {
                match (var($name), url.as_ref()) {
                    (Ok(ok), _) => ok.into(),
                    (Err(_), Some(e)) => e.$field.clone(),
                    (Err(_), None) => def.$field.clone(),
                }
            };
        }

        let user = env!("PGUSER", user);
        let pass = env!("PGPASSWORD", pass);
        let host = env!("PGHOST", host);
        let application_name = env!("PGAPPNAME", application_name);
        let socket = url.as_ref().and_then(|e| e.socket.clone());

        let dbname = match (var("PGDATABASE"), url.as_ref()) {
            (Ok(ok), _) => Some(ok.into()),
            (Err(_), Some(e)) => e.dbname.clone(),
            (Err(_), None) => None,
        };

        let port = match (var("PGPORT"), url.as_ref()) {
            (Ok(ok), _) => ok.parse().unwrap_or(def.port),
            (Err(_), Some(e)) => e.port,
            (Err(_), None) => def.port,
        };

        Self { user, pass, socket, host, port, dbname, application_name }
    }

    /// Parse config from url.
    ///
    /// The accepted form is `postgres://[user[:pass]@][host][:port][/dbname][?application_name=..]`,
    /// omitted parts take their default value.
    pub fn parse(url: &str) -> Result<Config, ParseError> {
        Self::parse_inner(ByteStr::copy_from_str(url))
    }

    /// Parse config from static string url.
    ///
    /// This is for micro optimization, see [`Bytes::from_static`][1].
    ///
    /// [1]: bytes::Bytes::from_static
    pub fn parse_static(url: &'static str) -> Result<Config, ParseError> {
        Self::parse_inner(ByteStr::from_static(url))
    }

    fn parse_inner(url: ByteStr) -> Result<Self, ParseError> {
        let defaults = Config::default();

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ParseError { reason: "scheme missing".into() });
        };
        if !matches!(scheme, "postgres" | "postgresql") {
            return Err(ParseError { reason: format!("unsupported scheme `{scheme}`").into() });
        }

        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let (userinfo, hostport) = match authority.rsplit_once('@') {
            Some((userinfo, hostport)) => (Some(userinfo), hostport),
            None => (None, authority),
        };

        let (user, pass) = match userinfo {
            Some(info) => {
                let (user, pass) = info.split_once(':').unwrap_or((info, &info[info.len()..]));
                (url.slice_ref(user), url.slice_ref(pass))
            }
            None => (defaults.user, defaults.pass),
        };

        let (host, port) = match hostport.rsplit_once(':') {
            Some((host, port)) => {
                let Ok(port) = port.parse() else {
                    return Err(ParseError { reason: "invalid port".into() })
                };
                (host, port)
            }
            None => (hostport, defaults.port),
        };
        let host = match host.is_empty() {
            true => defaults.host,
            false => url.slice_ref(host),
        };

        let (dbname, query) = match path.split_once('?') {
            Some((dbname, query)) => (dbname, Some(query)),
            None => (path, None),
        };

        let mut application_name = ByteStr::from_static(DEFAULT_APPLICATION_NAME);
        for pair in query.into_iter().flat_map(|query| query.split('&')) {
            match pair.split_once('=') {
                Some(("application_name", value)) => application_name = url.slice_ref(value),
                Some((_, _)) => {}
                None => {
                    return Err(ParseError { reason: format!("invalid query parameter `{pair}`").into() })
                }
            }
        }

        let dbname = (!dbname.is_empty()).then(|| url.slice_ref(dbname));

        Ok(Self { user, pass, host, port, dbname, socket: None, application_name })
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into().into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.pass = password.into().into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Database to connect to, defaults to the user name.
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = Some(dbname.into().into());
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into().into();
        self
    }

    /// Connect through unix domain socket at `path` instead of tcp.
    pub fn socket(mut self, path: impl Into<String>) -> Self {
        self.socket = Some(path.into().into());
        self
    }

    pub(crate) fn startup(&self) -> Startup<'_> {
        Startup {
            user: self.user.as_str(),
            database: self.dbname.as_deref(),
            application_name: Some(self.application_name.as_str()),
            replication: None,
        }
    }
}

impl std::str::FromStr for Config {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error when parsing url.
pub struct ParseError {
    pub(crate) reason: Cow<'static,str>,
}

impl std::error::Error for ParseError { }

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f.write_str(&self.reason)
        }
        write!(f, "failed to parse url: {}", self.reason)
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
