// src/config.rs
use crate::{
    error::{AppError, AppResult},
    services::password_policy::PasswordPolicy,
};
use std::{env, path::PathBuf};
use tower_cookies::Key;

pub const DEFAULT_EMPLOYEES_FILE: &str = "employees.xlsx";
pub const DEFAULT_HASH_COLUMN: &str = "password_hash";
pub const DEFAULT_FLAG_COLUMN: &str = "first_login";
pub const DEFAULT_MASTER_PASSWORD: &str = "123456";
pub const DEFAULT_SESSION_DATABASE_URL: &str = "sqlite://sessions.db";
pub const DEFAULT_PORT: u16 = 5000;

/// Chave mínima exigida pelo `cookie::Key` para assinar os cookies de sessão.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// Configuração da aplicação, lida das variáveis de ambiente (e do `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub employees_file: PathBuf,
    /// Quando definido, as credenciais vivem neste JSON em vez da planilha.
    pub credentials_file: Option<PathBuf>,
    /// Nome explícito da coluna de ID; sem ele a coluna é detetada.
    pub id_column: Option<String>,
    pub hash_column: String,
    pub flag_column: String,
    pub master_password: String,
    pub session_secret: String,
    pub session_database_url: String,
    pub port: u16,
    pub password_policy: PasswordPolicy,
    pub bcrypt_cost: u32,
    pub cache_enabled: bool,
    pub admin_token: Option<String>,
}

impl Config {
    /// Lê do ambiente do processo (o `.env` já foi carregado em `main`).
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Constrói a configuração a partir de uma função de consulta (facilita os testes).
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Valores vazios contam como ausentes
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let session_secret = get("SESSION_SECRET")
            .ok_or_else(|| AppError::Config("SESSION_SECRET não definida".into()))?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::Config(format!(
                "SESSION_SECRET precisa de pelo menos {} bytes",
                MIN_SESSION_SECRET_LEN
            )));
        }

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT inválida: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        let password_policy = match get("PASSWORD_POLICY") {
            Some(raw) => raw.parse::<PasswordPolicy>()?,
            None => PasswordPolicy::default(),
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or_else(|| AppError::Config(format!("BCRYPT_COST inválido: {}", raw)))?,
            None => bcrypt::DEFAULT_COST,
        };

        let cache_enabled = match get("CACHE_ENABLED") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| AppError::Config(format!("CACHE_ENABLED inválido: {}", raw)))?,
            None => true,
        };

        Ok(Config {
            employees_file: get("EMPLOYEES_FILE")
                .unwrap_or_else(|| DEFAULT_EMPLOYEES_FILE.into())
                .into(),
            credentials_file: get("CREDENTIALS_FILE").map(PathBuf::from),
            id_column: get("ID_COLUMN"),
            hash_column: get("HASH_COLUMN").unwrap_or_else(|| DEFAULT_HASH_COLUMN.into()),
            flag_column: get("FLAG_COLUMN").unwrap_or_else(|| DEFAULT_FLAG_COLUMN.into()),
            master_password: get("MASTER_PASSWORD")
                .unwrap_or_else(|| DEFAULT_MASTER_PASSWORD.into()),
            session_secret,
            session_database_url: get("SESSION_DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_SESSION_DATABASE_URL.into()),
            port,
            password_policy,
            bcrypt_cost,
            cache_enabled,
            admin_token: get("ADMIN_TOKEN"),
        })
    }

    /// Chave usada para assinar o cookie de sessão.
    pub fn session_key(&self) -> AppResult<Key> {
        Key::try_from(self.session_secret.as_bytes())
            .map_err(|e| AppError::Config(format!("SESSION_SECRET inválida: {}", e)))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "sim" => Some(true),
        "0" | "false" | "no" | "off" | "nao" | "não" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn secret() -> String {
        "s".repeat(MIN_SESSION_SECRET_LEN)
    }

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let s = secret();
        let config = config_from(&[("SESSION_SECRET", &s)]).unwrap();
        assert_eq!(config.employees_file, PathBuf::from(DEFAULT_EMPLOYEES_FILE));
        assert_eq!(config.hash_column, "password_hash");
        assert_eq!(config.flag_column, "first_login");
        assert_eq!(config.master_password, "123456");
        assert_eq!(config.port, 5000);
        assert_eq!(config.password_policy, PasswordPolicy::MinLength8);
        assert!(config.cache_enabled);
        assert!(config.credentials_file.is_none());
        assert!(config.admin_token.is_none());
        assert!(config.session_key().is_ok());
    }

    #[test]
    fn missing_or_short_secret_is_rejected() {
        assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
        assert!(matches!(
            config_from(&[("SESSION_SECRET", "curta")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn explicit_values_are_parsed() {
        let s = secret();
        let config = config_from(&[
            ("SESSION_SECRET", &s),
            ("PORT", "8080"),
            ("PASSWORD_POLICY", "digits4"),
            ("CREDENTIALS_FILE", "creds.json"),
            ("CACHE_ENABLED", "false"),
            ("ADMIN_TOKEN", "  "),
            ("BCRYPT_COST", "4"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.password_policy, PasswordPolicy::DigitsOnly4);
        assert_eq!(config.credentials_file, Some(PathBuf::from("creds.json")));
        assert!(!config.cache_enabled);
        assert!(config.admin_token.is_none());
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn invalid_port_and_policy_are_config_errors() {
        let s = secret();
        assert!(config_from(&[("SESSION_SECRET", &s), ("PORT", "abc")]).is_err());
        assert!(config_from(&[("SESSION_SECRET", &s), ("PASSWORD_POLICY", "x")]).is_err());
        assert!(config_from(&[("SESSION_SECRET", &s), ("BCRYPT_COST", "2")]).is_err());
    }
}
