// src/templates.rs
use crate::{
    error::{AppError, AppResult},
    models::employee::ProfileField,
};
use askama::Template;
use axum::response::Html;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
    // Reaparece no campo quando o login falha
    pub emp_id: String,
}

#[derive(Template)]
#[template(path = "change_password.html")]
pub struct ChangePasswordPage {
    pub error: Option<String>,
    /// Primeiro acesso: a mudança é obrigatória.
    pub forced: bool,
    pub require_current: bool,
    pub hint: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub emp_id: String,
    pub name: Option<String>,
    pub fields: Vec<ProfileField>,
    pub other: Vec<ProfileField>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "forgot.html")]
pub struct ForgotPage;

#[derive(Template)]
#[template(path = "message.html")]
pub struct MessagePage {
    pub title: String,
    pub message: String,
}

/// Renderiza um template, convertendo falhas em erro interno.
pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Falha ao renderizar template: {}", e);
        AppError::InternalServerError
    })
}
