//! Tipos de erro para o cliente do serviço de simulação.
//!
//! Define [`BackendError`] com variantes para respostas HTTP de erro,
//! recusas bem-formadas (`success: false`), respostas ilegíveis e erros de
//! rede. Usa `thiserror` para derivar `Display` e `Error`.

use thiserror::Error;

use crate::error::FailureKind;

/// Erros que podem ocorrer ao conversar com o serviço de simulação.
///
/// - [`ApiError`](BackendError::ApiError) — status HTTP fora da faixa 2xx
/// - [`Rejected`](BackendError::Rejected) — envelope `success: false` (ou sem `data`)
/// - [`Malformed`](BackendError::Malformed) — corpo que não forma um envelope válido
/// - [`InvalidUrl`](BackendError::InvalidUrl) — URL base inutilizável
/// - [`InvalidId`](BackendError::InvalidId) — id que não pode virar um segmento de caminho
/// - [`Network`](BackendError::Network) — falha na camada de transporte
#[derive(Debug, Error)]
pub enum BackendError {
    /// Status HTTP não-2xx. `message` vem do campo `error` do corpo quando
    /// presente, senão é a mensagem genérica do endpoint.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// O serviço respondeu 2xx mas recusou a operação.
    #[error("rejected: {message}")]
    Rejected { message: String },

    /// O corpo não pôde ser interpretado (JSON inválido, cidadão estruturalmente inválido).
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A URL base configurada não é uma URL HTTP com caminho.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Id vazio, `.` ou `..`; nunca chega ao serviço.
    #[error("invalid id in request path: `{0}`")]
    InvalidId(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl BackendError {
    /// Motivo informado pelo próprio serviço, quando houver.
    pub fn server_reason(&self) -> Option<&str> {
        match self {
            BackendError::ApiError { message, .. } | BackendError::Rejected { message } => {
                Some(message)
            }
            BackendError::Malformed(_)
            | BackendError::InvalidUrl(_)
            | BackendError::InvalidId(_)
            | BackendError::Network(_) => None,
        }
    }

    /// Recusas e erros 4xx são de negócio; o resto é de infraestrutura.
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendError::ApiError { status, .. } if *status < 500 => FailureKind::Business,
            BackendError::Rejected { .. } | BackendError::InvalidId(_) => FailureKind::Business,
            _ => FailureKind::System,
        }
    }
}
