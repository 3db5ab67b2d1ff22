//! Line-oriented command front-end over [`AsterankService`].
use std::sync::Arc;

use regex::Regex;
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::service::AsterankService;

const DEFAULT_LIMIT: usize = 10;

const HELP: &str = "commands: /rankings <criterion> [limit] [orbits], /autocomplete <query> [limit], \
/jpl <designation>, /exoplanets {filter} [limit], /mpc {filter} [limit], /kepler {filter} [limit], \
/asterank {filter} [limit], /user-objects [limit], /submit {object} [image keys...]";

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error("{0}")]
    Usage(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub struct CommandHandler {
    service: Arc<AsterankService>,
}

impl CommandHandler {
    pub fn new(service: Arc<AsterankService>) -> Self {
        Self { service }
    }

    /// Run one command line and return the JSON reply. Failures become
    /// `{"error": ...}` objects.
    pub async fn handle_line(&self, line: &str) -> Value {
        let Some((command, args)) = parse_command(line) else {
            return json!({ "error": format!("Command parse failed. {}", HELP) });
        };

        match self.router(&command, &args).await {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    CommandError::Core(CoreError::Store(_)) => tracing::error!("/{} failed: {}", command, e),
                    _ => tracing::debug!("/{} rejected: {}", command, e),
                }
                json!({ "error": e.to_string() })
            }
        }
    }

    async fn router(&self, command: &str, args: &str) -> Result<Value, CommandError> {
        match command {
            "rankings" => {
                let mut parts = args.split_whitespace();
                let criterion = parts
                    .next()
                    .ok_or_else(|| CommandError::Usage("usage: /rankings <criterion> [limit] [orbits]".to_string()))?;
                let limit = parse_limit(parts.next())?;
                let orbits_only = parts.next() == Some("orbits");
                let ranking = self
                    .service
                    .rankings(criterion, limit, orbits_only)
                    .await?
                    .ok_or_else(|| CommandError::NotFound(format!("Ranking '{}'", criterion)))?;
                Ok(to_json(&ranking))
            }
            "autocomplete" => {
                let mut parts = args.split_whitespace();
                let query = parts
                    .next()
                    .ok_or_else(|| CommandError::Usage("usage: /autocomplete <query> [limit]".to_string()))?;
                let limit = parse_limit(parts.next())?;
                Ok(to_json(&self.service.autocomplete(query, limit).await?))
            }
            "jpl" => {
                let designation = args.trim();
                if designation.is_empty() {
                    return Err(CommandError::Usage("usage: /jpl <designation>".to_string()));
                }
                let ephemeris = self
                    .service
                    .jpl_lookup(designation)
                    .await?
                    .ok_or_else(|| CommandError::NotFound(format!("Ephemeris for '{}'", designation)))?;
                Ok(Value::Object(ephemeris))
            }
            "exoplanets" => {
                let (query, rest) = split_json(args)?;
                let Value::Object(query) = query else {
                    return Err(CommandError::Usage("exoplanet filter must be a JSON object".to_string()));
                };
                let limit = parse_limit(rest.split_whitespace().next())?;
                Ok(to_json(&self.service.exoplanets(&query, limit).await?))
            }
            "mpc" | "kepler" | "asterank" => {
                let (query, rest) = split_json(args)?;
                let limit = parse_limit(rest.split_whitespace().next())?;
                let results = match command {
                    "mpc" => self.service.mpc(&query, limit).await?,
                    "kepler" => self.service.kepler(&query, limit).await?,
                    _ => self.service.asterank(&query, limit).await?,
                };
                Ok(to_json(&results))
            }
            "user-objects" => {
                let limit = parse_limit(args.split_whitespace().next())?;
                Ok(to_json(&self.service.user_objects(limit).await?))
            }
            "submit" => {
                let (object, rest) = split_json(args)?;
                let Value::Object(object) = object else {
                    return Err(CommandError::Usage("user object must be a JSON object".to_string()));
                };
                let keys: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
                let keys = (!keys.is_empty()).then_some(keys);
                Ok(self.service.insert_user_object(object, keys).await?)
            }
            "help" | "h" => Ok(json!({ "help": HELP })),
            _ => Err(CommandError::Usage(format!("Unknown command '/{}'. {}", command, HELP))),
        }
    }
}

/// Split `/command args` into its parts.
fn parse_command(content: &str) -> Option<(String, String)> {
    let re = Regex::new(r"^\s*/(\S+)\s*(.*)$").ok()?;
    let caps = re.captures(content)?;
    let command = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let args = caps.get(2).map_or("", |m| m.as_str()).to_string();
    Some((command, args))
}

fn parse_limit(arg: Option<&str>) -> Result<usize, CommandError> {
    match arg {
        None => Ok(DEFAULT_LIMIT),
        Some(text) => text
            .parse()
            .map_err(|_| CommandError::Usage(format!("Invalid limit '{}'", text))),
    }
}

/// Read one leading JSON value from `args`, returning it and the remainder.
fn split_json(args: &str) -> Result<(Value, &str), CommandError> {
    let mut stream = serde_json::Deserializer::from_str(args).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok((value, &args[stream.byte_offset()..])),
        Some(Err(e)) => Err(CommandError::Core(CoreError::InvalidInput(format!("Bad JSON filter: {}", e)))),
        None => Ok((json!({}), "")),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}
