use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PoolError {
    /// Пул уже остановлен: отправка заданий и повторный shutdown отклоняются
    #[error("pool is already shut down")]
    Closed,
}
