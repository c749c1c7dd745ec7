use clap::Parser;
use database::Database;

pub mod auth;
pub mod i18n;

use i18n::Locale;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:spending.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Language used until a visitor picks one
    #[arg(long, env = "DEFAULT_LOCALE", default_value = "cn")]
    pub default_locale: Locale,

    /// Upper bound on digits typed into the amount keypad
    #[arg(long, env = "MAX_AMOUNT_DIGITS", default_value = "12")]
    pub max_amount_digits: usize,

    #[arg(long, env = "SECURE_COOKIES")]
    pub secure_cookies: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::try_parse_from(["spending_tracker"]).unwrap();
        assert_eq!(config.default_locale, Locale::Cn);
        assert_eq!(config.max_amount_digits, 12);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_config_flags() {
        let config = Config::try_parse_from([
            "spending_tracker",
            "--default-locale",
            "en",
            "--max-amount-digits",
            "8",
        ])
        .unwrap();
        assert_eq!(config.default_locale, Locale::En);
        assert_eq!(config.max_amount_digits, 8);
    }
}
