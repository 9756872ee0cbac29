//! Error taxonomy for a single poll cycle.
//!
//! The `Display` texts end up inside the failure notification sent to the
//! chat, so they are written in the same language as the status messages.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Эндпоинт {url} недоступен: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Неверный код ответа от API: {0}")]
    UnexpectedStatus(u16),
    #[error("Не удалось получить json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("В ответе API отсутствует ключ {0}")]
    MissingKey(&'static str),
    #[error("{0}")]
    UnexpectedType(&'static str),
    #[error("Поле {0} не строка")]
    NotAString(&'static str),
    #[error("Неизвестный статус работы: {0}")]
    UnknownStatus(String),
}

impl PollError {
    /// Short machine-friendly tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PollError::Connection { .. } => "connection",
            PollError::UnexpectedStatus(_) => "unexpected_status",
            PollError::Decode(_) => "decode",
            PollError::MissingKey(_) => "missing_key",
            PollError::UnexpectedType(_) | PollError::NotAString(_) => "unexpected_type",
            PollError::UnknownStatus(_) => "unknown_status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(
            PollError::UnexpectedStatus(503).to_string(),
            "Неверный код ответа от API: 503"
        );
        assert_eq!(
            PollError::MissingKey("homeworks").to_string(),
            "В ответе API отсутствует ключ homeworks"
        );
        assert_eq!(
            PollError::UnknownStatus("lost".into()).to_string(),
            "Неизвестный статус работы: lost"
        );
    }

    #[test]
    fn decode_errors_convert() {
        let err: PollError = serde_json::from_str::<serde_json::Value>("nope")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "decode");
        assert!(err.to_string().starts_with("Не удалось получить json:"));
    }
}
