use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "HANDOFF_CONFIG_DIR";

// ── Top-level config ──────────────────────────────────────────────

/// Top-level handoff configuration, loaded from `config.toml`.
///
/// Resolution order: `HANDOFF_CONFIG_DIR` env → `~/.handoff/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Listener configuration (`[gateway]`).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Automated agent backend (`[agent]`).
    #[serde(default)]
    pub agent: AgentConfig,

    /// Conversation constants applied by the router (`[conversation]`).
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Customer record storage (`[store]`).
    #[serde(default)]
    pub store: StoreConfig,
}

// ── Gateway ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Gateway port (default: 8080)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    8080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// `"scripted"` (offline, default) or `"dialogflow"`.
    #[serde(default = "default_agent_backend")]
    pub backend: String,
    /// Agent project. Required for `dialogflow`.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Override for the Dialogflow REST endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Bearer token sent with every agent request. Overridden by `HANDOFF_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound on a single agent call (default: 10).
    #[serde(default = "default_agent_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_agent_backend() -> String {
    "scripted".into()
}

fn default_agent_timeout_secs() -> u64 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: default_agent_backend(),
            project_id: None,
            base_url: None,
            api_key: None,
            timeout_secs: default_agent_timeout_secs(),
        }
    }
}

// ── Conversation ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Appended after the agent's hand-off line on escalation.
    #[serde(default = "default_operator_greeting")]
    pub operator_greeting: String,
    /// Short name of the output context that requests a human.
    #[serde(default = "default_escalation_context")]
    pub escalation_context: String,
    /// Event sent to the agent on first contact.
    #[serde(default = "default_welcome_event")]
    pub welcome_event: String,
    #[serde(default = "default_language_code")]
    pub language_code: String,
}

fn default_operator_greeting() -> String {
    "Hello, I'm a human. How can I help you?".into()
}

fn default_escalation_context() -> String {
    "operator_request".into()
}

fn default_welcome_event() -> String {
    "WELCOME".into()
}

fn default_language_code() -> String {
    "en".into()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            operator_greeting: default_operator_greeting(),
            escalation_context: default_escalation_context(),
            welcome_event: default_welcome_event(),
            language_code: default_language_code(),
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend (default: `"memory"`).
    #[serde(default = "default_store_kind")]
    pub kind: String,
}

fn default_store_kind() -> String {
    "memory".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
        }
    }
}

// ── Config impl ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        Self {
            config_path: home.join(".handoff").join(CONFIG_FILE_NAME),
            gateway: GatewayConfig::default(),
            agent: AgentConfig::default(),
            conversation: ConversationConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

fn default_config_dir() -> Result<PathBuf> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".handoff"))
}

fn resolve_config_dir() -> Result<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
        _ => default_config_dir(),
    }
}

fn env_value(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

impl Config {
    /// Load `config.toml` from the resolved config directory, writing the
    /// defaults first when the file does not exist yet.
    pub async fn load_or_init() -> Result<Self> {
        let config_dir = resolve_config_dir()?;
        Self::load_or_init_in(&config_dir).await
    }

    pub async fn load_or_init_in(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        fs::create_dir_all(config_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let initialized = !config_path.exists();
        let mut config = if initialized {
            let mut config = Config::default();
            config.config_path = config_path.clone();
            config.save().await?;

            // Restrict permissions on newly created config file (may contain API keys)
            #[cfg(unix)]
            {
                use std::{fs::Permissions, os::unix::fs::PermissionsExt};
                let _ = fs::set_permissions(&config_path, Permissions::from_mode(0o600)).await;
            }
            config
        } else {
            let contents = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path.clone();
            config
        };

        config.apply_env_overrides();
        config.validate()?;
        tracing::info!(
            path = %config.config_path.display(),
            initialized,
            "Config loaded"
        );
        Ok(config)
    }

    /// Validate configuration values that would cause runtime failures.
    pub fn validate(&self) -> Result<()> {
        // Gateway
        if self.gateway.host.trim().is_empty() {
            anyhow::bail!("gateway.host must not be empty");
        }

        // Agent
        if self.agent.timeout_secs == 0 {
            anyhow::bail!("agent.timeout_secs must be greater than 0");
        }
        if self.agent.backend == "dialogflow"
            && self
                .agent
                .project_id
                .as_deref()
                .map_or(true, |p| p.trim().is_empty())
        {
            anyhow::bail!("agent.project_id is required when agent.backend = 'dialogflow'");
        }

        // Conversation
        if self.conversation.operator_greeting.trim().is_empty() {
            anyhow::bail!("conversation.operator_greeting must not be empty");
        }
        if self.conversation.escalation_context.trim().is_empty() {
            anyhow::bail!("conversation.escalation_context must not be empty");
        }

        Ok(())
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        // Host: HANDOFF_GATEWAY_HOST or HOST
        if let Some(host) = env_value(&["HANDOFF_GATEWAY_HOST", "HOST"]) {
            self.gateway.host = host;
        }

        // Port: HANDOFF_GATEWAY_PORT or PORT; unparsable values are ignored
        if let Some(port) = env_value(&["HANDOFF_GATEWAY_PORT", "PORT"])
            .and_then(|p| p.parse::<u16>().ok())
        {
            self.gateway.port = port;
        }

        if let Some(backend) = env_value(&["HANDOFF_AGENT_BACKEND"]) {
            self.agent.backend = backend;
        }

        if let Some(project_id) = env_value(&["HANDOFF_PROJECT_ID"]) {
            self.agent.project_id = Some(project_id);
        }

        if let Some(key) = env_value(&["HANDOFF_API_KEY"]) {
            self.agent.api_key = Some(key);
        }

        if let Some(secs) =
            env_value(&["HANDOFF_AGENT_TIMEOUT_SECS"]).and_then(|s| s.parse::<u64>().ok())
        {
            self.agent.timeout_secs = secs;
        }
    }

    /// Write the config atomically: temp file in the same directory, then rename.
    pub async fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let parent_dir = self
            .config_path
            .parent()
            .context("Config path must have a parent directory")?;

        fs::create_dir_all(parent_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                parent_dir.display()
            )
        })?;

        let file_name = self
            .config_path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or(CONFIG_FILE_NAME);
        let temp_path = parent_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));

        let mut temp_file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create temporary config file: {}",
                    temp_path.display()
                )
            })?;
        temp_file
            .write_all(toml_str.as_bytes())
            .await
            .context("Failed to write temporary config contents")?;
        temp_file
            .sync_all()
            .await
            .context("Failed to fsync temporary config file")?;
        drop(temp_file);

        if let Err(e) = fs::rename(&temp_path, &self.config_path).await {
            let _ = fs::remove_file(&temp_path).await;
            anyhow::bail!("Failed to atomically replace config file: {e}");
        }

        Ok(())
    }
}
