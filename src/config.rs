use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub studio: StudioConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Browser origins allowed to call the API; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret of the identity provider that issues session tokens
    pub jwt_secret: String,
    pub access_token_expiration_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioConfig {
    /// Capacity given to newly created organizations
    #[serde(default = "default_class_capacity")]
    pub default_class_capacity: i32,
    #[serde(default = "default_class_duration_minutes")]
    pub class_duration_minutes: i32,
    /// Offset of the studio's wall clock from UTC, used for "today" and template times
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Grant one reposition credit when a Pontual/Recorrente attendee is marked absent
    #[serde(default = "default_true")]
    pub auto_grant_on_absence: bool,
    #[serde(default = "default_max_series_weeks")]
    pub max_series_weeks: u32,
    /// How far ahead open-ended templates are expanded
    #[serde(default = "default_template_horizon_weeks")]
    pub template_horizon_weeks: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_class_capacity() -> i32 {
    10
}

fn default_class_duration_minutes() -> i32 {
    60
}

fn default_true() -> bool {
    true
}

fn default_max_series_weeks() -> u32 {
    8
}

fn default_template_horizon_weeks() -> u32 {
    12
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            default_class_capacity: default_class_capacity(),
            class_duration_minutes: default_class_duration_minutes(),
            utc_offset_minutes: 0,
            auto_grant_on_absence: true,
            max_series_weeks: default_max_series_weeks(),
            template_horizon_weeks: default_template_horizon_weeks(),
        }
    }
}

impl StudioConfig {
    pub fn utc_offset(&self) -> time::UtcOffset {
        time::UtcOffset::from_whole_seconds(self.utc_offset_minutes * 60)
            .unwrap_or(time::UtcOffset::UTC)
    }

    /// Current calendar date on the studio's wall clock
    pub fn today(&self) -> time::Date {
        time::OffsetDateTime::now_utc()
            .to_offset(self.utc_offset())
            .date()
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        // config.yml is required; STUDIODESK__SECTION__KEY variables override it
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("STUDIODESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
