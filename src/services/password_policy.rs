// src/services/password_policy.rs
use crate::error::AppError;
use std::str::FromStr;
use thiserror::Error;

/// Regras para uma nova senha. Cada variante corresponde a um `PASSWORD_POLICY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordPolicy {
    /// `min8`: pelo menos 8 caracteres.
    #[default]
    MinLength8,
    /// `digits4`: só dígitos, pelo menos 4.
    DigitsOnly4,
    /// `min6-current`: pelo menos 6 caracteres e a senha atual tem de ser confirmada.
    MinLength6WithCurrent,
}

/// Motivo pelo qual uma mudança de senha foi recusada (mostrado ao utilizador).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordRejection {
    #[error("As senhas não coincidem.")]
    Mismatch,
    #[error("A senha deve ter pelo menos {0} caracteres.")]
    TooShort(usize),
    #[error("A senha deve conter apenas números.")]
    NotDigits,
    #[error("Indique a senha atual.")]
    MissingCurrent,
    #[error("A senha atual está incorreta.")]
    WrongCurrent,
}

impl PasswordPolicy {
    pub fn min_length(&self) -> usize {
        match self {
            PasswordPolicy::MinLength8 => 8,
            PasswordPolicy::DigitsOnly4 => 4,
            PasswordPolicy::MinLength6WithCurrent => 6,
        }
    }

    pub fn requires_current(&self) -> bool {
        matches!(self, PasswordPolicy::MinLength6WithCurrent)
    }

    /// Texto de ajuda mostrado no formulário.
    pub fn hint(&self) -> String {
        match self {
            PasswordPolicy::DigitsOnly4 => {
                format!("Apenas números, mínimo {} dígitos.", self.min_length())
            }
            _ => format!("Mínimo {} caracteres.", self.min_length()),
        }
    }

    /// Verifica a confirmação e o formato (não a senha atual, que exige o hash).
    pub fn check(&self, new_password: &str, confirmation: &str) -> Result<(), PasswordRejection> {
        if new_password != confirmation {
            return Err(PasswordRejection::Mismatch);
        }
        if new_password.chars().count() < self.min_length() {
            return Err(PasswordRejection::TooShort(self.min_length()));
        }
        if *self == PasswordPolicy::DigitsOnly4 && !new_password.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PasswordRejection::NotDigits);
        }
        Ok(())
    }
}

impl FromStr for PasswordPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min8" => Ok(PasswordPolicy::MinLength8),
            "digits4" => Ok(PasswordPolicy::DigitsOnly4),
            "min6-current" | "min6_current" => Ok(PasswordPolicy::MinLength6WithCurrent),
            other => Err(AppError::Config(format!("PASSWORD_POLICY desconhecida: {}", other))),
        }
    }
}
