// src/error.rs
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados de sessões: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro ao ler a planilha: {0}")]
    SpreadsheetRead(#[from] calamine::XlsxError),

    #[error("Erro ao gravar a planilha: {0}")]
    SpreadsheetWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("A planilha não tem folhas ou está vazia")]
    EmptySpreadsheet,

    // Coluna obrigatória (ID, hash, flag) ausente ou não detetada
    #[error("Coluna em falta na planilha: {0}")]
    MissingColumn(String),

    #[error("Erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro no ficheiro de credenciais: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuração inválida: {0}")]
    Config(String),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Recurso não encontrado")]
    NotFound,

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Loga o erro detalhado no servidor, o utilizador só vê a mensagem genérica
        tracing::error!("Erro processado: {:?}", self);

        let (status, user_message) = match self {
            AppError::SpreadsheetRead(_)
            | AppError::SpreadsheetWrite(_)
            | AppError::EmptySpreadsheet
            | AppError::Io(_)
            | AppError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Não foi possível aceder aos dados dos funcionários.",
            ),
            AppError::MissingColumn(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "A planilha de funcionários não tem as colunas esperadas.",
            ),
            AppError::SqlxError(_) | AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro na gestão da sua sessão.")
            }
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Erro de configuração."),
            AppError::PasswordHashingError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao processar credenciais.")
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Página não encontrada."),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Acesso não autorizado."),
            AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><meta charset="utf-8"><title>Erro</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Erro {status_code}</h1><p>{message}</p><a href="/login">Voltar</a></body></html>
         "#, status_code=status.as_u16(), message=user_message))).into_response()
    }
}

pub type AppResult<T = ()> = Result<T, AppError>;
