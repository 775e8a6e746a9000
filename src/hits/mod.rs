//! 点击计数
//!
//! 重定向路径只做内存累加，由后台任务批量写回存储。

mod manager;
mod sink;

pub use manager::HitCounter;
pub use sink::HitSink;
