use contracts::dashboards::d402_order_sales::JoinMode;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body cap for the analysis endpoints, in megabytes
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_mb: 200,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Defaults applied when a request leaves a parameter out
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub join_mode: JoinMode,
    pub top_n: usize,
    /// Currency label attached to money KPI cards
    pub currency: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            join_mode: JoinMode::OrdersAnchored,
            top_n: 10,
            currency: "сум".to_string(),
        }
    }
}

/// Accepted source headers for every canonical column.
///
/// Defaults follow the 1C export ("Период", "Номенклатура", ...). Both spellings of the
/// returned-quantity header are accepted because the export itself is inconsistent.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub orders: OrderColumns,
    #[serde(default)]
    pub sales: SalesColumns,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OrderColumns {
    pub period: Vec<String>,
    pub quantity: Vec<String>,
    pub amount: Vec<String>,
    pub product: Vec<String>,
    pub counterparty: Vec<String>,
}

impl Default for OrderColumns {
    fn default() -> Self {
        Self {
            period: headers(&["Период", "period"]),
            quantity: headers(&["Количество", "quantity"]),
            amount: headers(&["Сумма", "amount"]),
            product: headers(&["Номенклатура", "product"]),
            counterparty: headers(&["Контрагент", "counterparty"]),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SalesColumns {
    pub period: Vec<String>,
    pub sold_quantity: Vec<String>,
    pub returned_quantity: Vec<String>,
    pub sold_amount: Vec<String>,
    pub returned_amount: Vec<String>,
    pub product: Vec<String>,
    pub counterparty: Vec<String>,
}

impl Default for SalesColumns {
    fn default() -> Self {
        Self {
            period: headers(&["Период", "period"]),
            sold_quantity: headers(&["Количество", "sold_quantity"]),
            returned_quantity: headers(&[
                "Возрат количество",
                "Возврат количество",
                "returned_quantity",
            ]),
            sold_amount: headers(&["Продажная сумма", "sold_amount"]),
            returned_amount: headers(&["Возврат сумма", "returned_amount"]),
            product: headers(&["Номенклатура", "product"]),
            counterparty: headers(&["Контрагент", "counterparty"]),
        }
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000
max_upload_mb = 200

[analysis]
join_mode = "orders_anchored"
top_n = 10
currency = "сум"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Current working directory (for `cargo run`)
/// 3. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    for config_path in candidate_paths() {
        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)?;
            return Ok(config);
        }
        tracing::debug!("config.toml not found at: {}", config_path.display());
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("config.toml"));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config.toml"));
    }
    paths
}

/// Install the process-wide configuration. Only the first call has an effect.
pub fn init_config(config: Config) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("Configuration already initialized, ignoring second init");
    }
}

/// Process-wide configuration; built-in defaults until `init_config` has run
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
