// src/services/auth_service.rs
use crate::error::{AppError, AppResult};
use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha512};

/// Formato de um hash guardado na planilha ou no ficheiro de credenciais.
#[derive(Debug, PartialEq, Eq)]
enum StoredHash<'a> {
    Bcrypt(&'a str),
    /// `pbkdf2:<digest>:<iterações>$<salt>$<hex>` (werkzeug).
    Pbkdf2 {
        digest: Digest,
        iterations: u32,
        salt: &'a str,
        expected: Vec<u8>,
    },
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Digest {
    Sha256,
    Sha512,
}

impl<'a> StoredHash<'a> {
    fn parse(stored: &'a str) -> Self {
        let stored = stored.trim();
        if stored.starts_with("$2") {
            return StoredHash::Bcrypt(stored);
        }
        Self::parse_pbkdf2(stored).unwrap_or(StoredHash::Unknown)
    }

    fn parse_pbkdf2(stored: &'a str) -> Option<Self> {
        let mut parts = stored.splitn(3, '$');
        let (method, salt, hex_hash) = (parts.next()?, parts.next()?, parts.next()?);

        let mut method = method.split(':');
        if method.next()? != "pbkdf2" {
            return None;
        }
        let digest = match method.next()? {
            "sha256" => Digest::Sha256,
            "sha512" => Digest::Sha512,
            _ => return None,
        };
        let iterations = method.next()?.parse().ok().filter(|&n| n > 0)?;
        let expected = hex::decode(hex_hash).ok().filter(|h| !h.is_empty())?;

        Some(StoredHash::Pbkdf2 {
            digest,
            iterations,
            salt,
            expected,
        })
    }
}

/// Indica se o hash guardado deve ser regravado em bcrypt.
pub fn needs_rehash(stored_hash: &str) -> bool {
    !matches!(StoredHash::parse(stored_hash), StoredHash::Bcrypt(_))
}

/// Verifica se a senha fornecida corresponde ao hash guardado.
///
/// Hashes ilegíveis contam como senha errada, não como falha do servidor.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || match StoredHash::parse(&stored_hash) {
        StoredHash::Bcrypt(hash) => {
            tracing::debug!("Verificando hash bcrypt...");
            bcrypt::verify(&password, hash).unwrap_or_else(|e| {
                tracing::warn!("Hash bcrypt inválido guardado: {:?}", e);
                false
            })
        }
        StoredHash::Pbkdf2 {
            digest,
            iterations,
            salt,
            expected,
        } => {
            tracing::debug!("Verificando hash pbkdf2 ({:?}, {} iterações)...", digest, iterations);
            let mut derived = vec![0u8; expected.len()];
            match digest {
                Digest::Sha256 => {
                    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived)
                }
                Digest::Sha512 => {
                    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived)
                }
            }
            bytes_match(&derived, &expected)
        }
        StoredHash::Unknown => {
            tracing::warn!("Formato de hash desconhecido; login recusado.");
            false
        }
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })
}

/// Gera um hash bcrypt com o custo configurado.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt (custo {})...", cost);
        bcrypt::hash(&password, cost)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

fn bytes_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
