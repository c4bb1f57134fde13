//! Configuration loading (spec.md §6 "Configuration keys", SPEC_FULL.md §A.3).
//!
//! Precedence, lowest to highest: compiled-in defaults, a TOML file
//! (`--config` / `TRELLIS_CONFIG`), environment variables (after `dotenvy`
//! loads `.env`), then CLI flags. Unknown keys are ignored; boolean keys
//! accept `true|false`.

use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "trellis-server", about = "LDP / Memento / WebAC HTTP server")]
pub struct Cli {
    /// Path to a TOML configuration file. Falls back to `TRELLIS_CONFIG`.
    #[arg(long, env = "TRELLIS_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "TRELLIS_HTTP_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, env = "TRELLIS_SERVER_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    #[arg(long, env = "TRELLIS_FILE_STORAGE_ROOT")]
    pub storage_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct TomlConfig {
    http: HttpSection,
    file: FileSection,
    namespaces: NamespacesSection,
    auth: AuthSection,
    jsonld: JsonLdSection,
    log: LogSection,
    server: ServerSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct HttpSection {
    #[serde(rename = "base-url")]
    base_url: Option<String>,
    #[serde(rename = "extension-graphs")]
    extension_graphs: HashMap<String, String>,
    #[serde(rename = "weak-etag")]
    weak_etag: Option<bool>,
    #[serde(rename = "precondition-required")]
    precondition_required: Option<bool>,
    #[serde(rename = "put-uncontained")]
    put_uncontained: Option<bool>,
    #[serde(rename = "patch-create")]
    patch_create: Option<bool>,
    #[serde(rename = "memento-header-dates")]
    memento_header_dates: Option<bool>,
    #[serde(rename = "web-sub-hub")]
    web_sub_hub: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct FileSection {
    #[serde(rename = "storage-root")]
    storage_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct NamespacesSection {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct AuthSection {
    #[serde(rename = "admin-users")]
    admin_users: Vec<String>,
    realm: Option<String>,
    scope: Option<String>,
    #[serde(rename = "webac-cache-size")]
    webac_cache_size: Option<u64>,
    #[serde(rename = "webac-cache-expire-seconds")]
    webac_cache_expire_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct JsonLdSection {
    #[serde(rename = "profile-fetch-timeout-seconds")]
    profile_fetch_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct LogSection {
    format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct ServerSection {
    #[serde(rename = "bind-address")]
    bind_address: Option<String>,
    #[serde(rename = "request-timeout-seconds")]
    request_timeout_seconds: Option<u64>,
}

/// Fully resolved server configuration, assembled from defaults, TOML, env,
/// and CLI flags (spec.md §6).
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub bind_address: String,
    pub storage_root: PathBuf,
    pub extension_graphs: HashMap<String, String>,
    pub weak_etag: bool,
    pub precondition_required: bool,
    pub put_uncontained: bool,
    pub patch_create: bool,
    pub memento_header_dates: bool,
    pub web_sub_hub: Option<String>,
    pub namespaces_path: PathBuf,
    pub admin_users: Vec<String>,
    pub auth_realm: String,
    pub auth_scope: String,
    pub webac_cache_size: u64,
    pub webac_cache_expire_seconds: u64,
    pub profile_fetch_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Config {
    /// Loads `Config` from (in increasing precedence) compiled-in defaults, an
    /// optional TOML file, environment variables via `clap(env)`, then
    /// explicit CLI flags.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let toml_config = match &cli.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| anyhow::anyhow!("reading config file {}: {err}", path.display()))?;
                toml::from_str(&contents)
                    .map_err(|err| anyhow::anyhow!("parsing config file {}: {err}", path.display()))?
            }
            None => TomlConfig::default(),
        };

        let storage_root = cli
            .storage_root
            .clone()
            .or(toml_config.file.storage_root)
            .unwrap_or_else(|| PathBuf::from("./data"));

        Ok(Self {
            base_url: cli
                .base_url
                .clone()
                .or(toml_config.http.base_url)
                .unwrap_or_else(|| "http://localhost:8080/".to_string()),
            bind_address: cli
                .bind_address
                .clone()
                .or(toml_config.server.bind_address)
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            extension_graphs: toml_config.http.extension_graphs,
            weak_etag: toml_config.http.weak_etag.unwrap_or(true),
            precondition_required: toml_config.http.precondition_required.unwrap_or(false),
            put_uncontained: toml_config.http.put_uncontained.unwrap_or(false),
            patch_create: toml_config.http.patch_create.unwrap_or(false),
            memento_header_dates: toml_config.http.memento_header_dates.unwrap_or(true),
            web_sub_hub: toml_config.http.web_sub_hub,
            namespaces_path: toml_config.namespaces.path.unwrap_or_else(|| storage_root.join("namespaces.json")),
            admin_users: toml_config.auth.admin_users,
            auth_realm: toml_config.auth.realm.unwrap_or_else(|| "trellis".to_string()),
            auth_scope: toml_config.auth.scope.unwrap_or_else(|| "read write".to_string()),
            webac_cache_size: toml_config.auth.webac_cache_size.unwrap_or(10_000),
            webac_cache_expire_seconds: toml_config.auth.webac_cache_expire_seconds.unwrap_or(60),
            profile_fetch_timeout_seconds: toml_config.jsonld.profile_fetch_timeout_seconds.unwrap_or(10),
            request_timeout_seconds: toml_config.server.request_timeout_seconds.unwrap_or(30),
            log_format: match toml_config.log.format.as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            storage_root,
        })
    }
}
