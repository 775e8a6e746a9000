//! 进程生命周期：启动准备、HTTP 服务与优雅停机

pub mod lifetime;
pub mod modes;
