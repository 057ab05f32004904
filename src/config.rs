use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub model_path: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid PORT value: {}", e))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./analytics.db".to_string());

        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| "model/digit_model.onnx".to_string());

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (5 * 1024 * 1024).to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid MAX_UPLOAD_BYTES value: {}", e))?;

        Ok(Config {
            port,
            database_url,
            model_path,
            max_upload_bytes,
        })
    }

    /// Filesystem path of the SQLite database, without the `sqlite:` scheme.
    pub fn database_path(&self) -> &str {
        self.database_url
            .strip_prefix("sqlite:")
            .unwrap_or(&self.database_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: &str) -> Config {
        Config {
            port: 8000,
            database_url: url.to_string(),
            model_path: "model/digit_model.onnx".to_string(),
            max_upload_bytes: 1024,
        }
    }

    #[test]
    fn database_path_strips_scheme() {
        assert_eq!(config_with_url("sqlite:./data/analytics.db").database_path(), "./data/analytics.db");
    }

    #[test]
    fn database_path_accepts_bare_path() {
        assert_eq!(config_with_url("analytics.db").database_path(), "analytics.db");
    }
}
