use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub smtp: Option<SmtpConfig>,
    /// Orders stuck in `new` longer than this are canceled by the sweep.
    pub stale_order_hours: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let stale_order_hours = env::var("STALE_ORDER_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .unwrap_or(48);

        // Mail is optional: without SMTP_HOST the confirmation job only logs.
        let smtp = match env::var("SMTP_HOST") {
            Ok(smtp_host) => Some(SmtpConfig {
                host: smtp_host,
                username: env::var("SMTP_USERNAME")?,
                password: env::var("SMTP_PASSWORD")?,
                from_address: env::var("SMTP_FROM")?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            smtp,
            stale_order_hours,
        })
    }
}
