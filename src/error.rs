use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImsError {
    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка сохранения правил: {0}")]
    RulesPersist(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ImsError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! ims_error {
    (rules_persist, $($arg:tt)*) => {
        $crate::error::ImsError::RulesPersist(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::ImsError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::ImsError::Internal(format!($($arg)*))
    };
}
