//! Configuration for the settlement engine
//!
//! Sale parameters live in a TOML file, discoverable through a small search
//! path, with `IDO_*` environment-variable overrides layered on top. The
//! same structures seed the engine builder directly in embedded use.

use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use config::{Config as ConfigLoader, File, FileFormat};
use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};

use crate::convert::BPS_DENOMINATOR;
use crate::error::Error;
use crate::types::Address;

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "IDO";

// Standard sale parameters, denominated in smallest units of an 18-decimal
// sale token: 1 000 minimum request, 500 000 buyer cap, 750 000 referral cap.
const STANDARD_MIN_REQUEST: u128 = 1_000_000_000_000_000_000_000;
const STANDARD_BUYER_CAP: u128 = 500_000_000_000_000_000_000_000;
const STANDARD_REFERRAL_CAP: u128 = 750_000_000_000_000_000_000_000;
const STANDARD_MAX_REFERRED: u32 = 10;
const STANDARD_BONUS_BIPS: u16 = 1_500;

/// Sale-wide parameters. Set at construction; the amount fields stay
/// administrator-mutable through the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleParams {
    /// The asset being distributed.
    pub sale_token: Address,
    /// Decimal precision of the sale token.
    pub sale_decimals: u8,
    /// Smallest sale-token allocation a purchase may produce.
    pub min_request_amount: Uint128,
    /// Lifetime cap on sale tokens credited to one buyer.
    pub buyer_cap: Uint128,
    /// Distinct first-time buyers one referrer may be paid for.
    pub max_referred_count: u32,
    /// Lifetime cap on referral bonus earned by one referrer.
    pub referral_cap: Uint128,
    /// Referral bonus in basis points of the settled sale amount.
    pub referral_bonus_bips: u16,
    /// Sale window open, inclusive.
    pub start_time: DateTime<Utc>,
    /// Sale window close, inclusive.
    pub end_time: DateTime<Utc>,
    /// When false, only allow-listed buyers may purchase.
    pub public_sale: bool,
}

impl SaleParams {
    /// Standard parameters for an 18-decimal sale token: minimum request
    /// 1 000, buyer cap 500 000, ten referred buyers per referrer, referral
    /// cap 750 000, 15 % bonus, non-public.
    pub fn standard(
        sale_token: Address,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            sale_token,
            sale_decimals: 18,
            min_request_amount: Uint128::new(STANDARD_MIN_REQUEST),
            buyer_cap: Uint128::new(STANDARD_BUYER_CAP),
            max_referred_count: STANDARD_MAX_REFERRED,
            referral_cap: Uint128::new(STANDARD_REFERRAL_CAP),
            referral_bonus_bips: STANDARD_BONUS_BIPS,
            start_time,
            end_time,
            public_sale: false,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.sale_token.is_zero() {
            return Err(Error::Config("sale token address must not be zero".into()));
        }
        if self.start_time >= self.end_time {
            return Err(Error::Config(format!(
                "sale window is empty: start {} is not before end {}",
                self.start_time, self.end_time
            )));
        }
        if u64::from(self.referral_bonus_bips) > BPS_DENOMINATOR {
            return Err(Error::Config(format!(
                "referral bonus {} bips exceeds {}",
                self.referral_bonus_bips, BPS_DENOMINATOR
            )));
        }
        Ok(())
    }
}

/// Exchange-rate seed applied to the rate table at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSeed {
    pub token: Address,
    /// Sale units bought per `input` payment units.
    pub output: Uint128,
    pub input: Uint128,
    pub payment_decimals: u8,
}

/// Complete engine configuration: owner identity, sale parameters and the
/// initial rate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Owner identity authorized for administrative operations.
    pub owner: Address,
    /// Sale-wide parameters.
    pub sale: SaleParams,
    /// Payment tokens accepted from the start.
    #[serde(default)]
    pub rates: Vec<RateSeed>,
}

impl EngineConfig {
    /// Load configuration from a specific TOML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Default configuration file path under the user's config directory.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("ido-engine");
        path.push("engine.toml");
        path
    }

    /// Discover configuration: search the usual locations for an
    /// `engine.toml`, then layer `IDO_*` environment overrides on top.
    pub fn discover() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let config_dir =
            std_env::var(format!("{}_CONFIG_DIR", ENV_PREFIX)).unwrap_or_else(|_| "config".into());
        let search_paths = vec![
            Path::new(&config_dir).join("engine.toml"),
            PathBuf::from("config/engine.toml"),
            PathBuf::from("engine.toml"),
            Self::default_path(),
        ];

        let mut config = None;
        for path in &search_paths {
            if path.exists() {
                let settings = ConfigLoader::builder()
                    .add_source(File::from(path.as_path()).format(FileFormat::Toml))
                    .build()
                    .map_err(|e| {
                        Error::Config(format!("failed to load {}: {}", path.display(), e))
                    })?;
                config = Some(settings.try_deserialize::<EngineConfig>().map_err(|e| {
                    Error::Config(format!("failed to parse {}: {}", path.display(), e))
                })?);
                break;
            }
        }

        let mut config = config.ok_or_else(|| {
            Error::Config("no engine.toml found in the configuration search path".into())
        })?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `IDO_*` environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<(), Error> {
        if let Ok(owner) = std_env::var(format!("{}_OWNER", ENV_PREFIX)) {
            self.owner = owner.parse()?;
        }
        if let Ok(public) = std_env::var(format!("{}_PUBLIC_SALE", ENV_PREFIX)) {
            self.sale.public_sale = public
                .parse::<bool>()
                .map_err(|e| Error::Config(format!("invalid {}_PUBLIC_SALE: {}", ENV_PREFIX, e)))?;
        }
        if let Ok(start) = std_env::var(format!("{}_START_TIME", ENV_PREFIX)) {
            self.sale.start_time = parse_rfc3339(&format!("{}_START_TIME", ENV_PREFIX), &start)?;
        }
        if let Ok(end) = std_env::var(format!("{}_END_TIME", ENV_PREFIX)) {
            self.sale.end_time = parse_rfc3339(&format!("{}_END_TIME", ENV_PREFIX), &end)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.owner.is_zero() {
            return Err(Error::Config("owner address must not be zero".into()));
        }
        self.sale.validate()?;
        for seed in &self.rates {
            if seed.token.is_zero() {
                return Err(Error::Config(
                    "rate seed token address must not be zero".into(),
                ));
            }
            if seed.input.is_zero() {
                return Err(Error::Config(format!(
                    "rate seed for {} has zero input units",
                    seed.token
                )));
            }
        }
        Ok(())
    }
}

fn parse_rfc3339(var: &str, value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Config(format!("invalid {}: {}", var, e)))
}
