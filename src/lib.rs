//! Динамически расширяемый worker pool для обработки байтовых буферов
//!
//! # Features
//! - Одна общая MPMC-очередь заданий, каждый буфер достаётся ровно одному воркеру
//! - Рост пула через `start()` и сжатие через `drop_worker()` на лету
//! - Неблокирующая отправка: `process()` возвращается сразу
//! - Однократный shutdown, повторное использование отдаёт ошибку вместо краха
//! - Счётчик живых воркеров и метрики очереди

pub mod errors;
pub mod model;
pub mod pool;

pub use pool::{PoolInner,Config,Pool};
