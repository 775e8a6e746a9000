//! 短码生成器
//!
//! 生成器本身不判断短码是否空闲：候选码交给调用方的原子插入，
//! 插入返回 `Conflict` 时退避后换一个候选码重试。

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::GeneratorConfig;
use crate::errors::{Result, ShortlinkError};
use crate::storage::backend::retry::calculate_backoff;

const BASE62: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const BASE36_LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    alphabet: &'static [u8],
    max_attempts: u32,
    backoff_base_ms: u64,
    backoff_max_ms: u64,
    reserved: Vec<String>,
}

impl CodeGenerator {
    /// `ignore_case` 为 true 时只生成小写字母和数字，
    /// 避免生成的短码在规范化后与其他短码撞车
    pub fn new(config: &GeneratorConfig, ignore_case: bool, reserved: Vec<String>) -> Self {
        Self {
            length: config.length.max(1),
            alphabet: if ignore_case { BASE36_LOWER } else { BASE62 },
            max_attempts: config.max_attempts.max(1),
            backoff_base_ms: config.backoff_base_ms,
            backoff_max_ms: config.backoff_max_ms,
            reserved,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// 生成一个候选码（不保证未被占用）
    pub fn generate(&self) -> String {
        std::iter::repeat_with(|| self.alphabet[rand::random_range(0..self.alphabet.len())] as char)
            .take(self.length)
            .collect()
    }

    fn is_reserved(&self, code: &str) -> bool {
        self.reserved.iter().any(|r| r.eq_ignore_ascii_case(code))
    }

    /// 分配一个空闲短码
    ///
    /// `attempt` 应对候选码执行原子创建：成功返回 `Ok`，
    /// 已被占用返回 `Conflict`。其他错误直接向上传递。
    /// 连续 `max_attempts` 次冲突后返回 `Exhausted`。
    pub async fn allocate<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for n in 1..=self.max_attempts {
            let candidate = self.generate();
            if self.is_reserved(&candidate) {
                continue;
            }

            match attempt(candidate.clone()).await {
                Ok(value) => {
                    if n > 1 {
                        debug!("Allocated code '{}' after {} attempts", candidate, n);
                    }
                    return Ok(value);
                }
                Err(ShortlinkError::Conflict(_)) => {
                    if n < self.max_attempts {
                        let delay = calculate_backoff(n, self.backoff_base_ms, self.backoff_max_ms);
                        debug!(
                            "Code '{}' already taken (attempt {}/{}), retrying in {} ms",
                            candidate, n, self.max_attempts, delay
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            "Code generator exhausted after {} attempts (length {})",
            self.max_attempts, self.length
        );
        Err(ShortlinkError::exhausted(format!(
            "Could not allocate a free short code after {} attempts",
            self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config(length: usize, max_attempts: u32) -> GeneratorConfig {
        GeneratorConfig {
            length,
            max_attempts,
            backoff_base_ms: 1,
            backoff_max_ms: 2,
        }
    }

    #[test]
    fn test_generate_length_and_charset() {
        let generator = CodeGenerator::new(&config(8, 4), false, vec![]);
        for _ in 0..100 {
            let code = generator.generate();
            assert_eq!(code.len(), 8);
            assert!(code.bytes().all(|b| BASE62.contains(&b)));
        }
    }

    #[test]
    fn test_ignore_case_generates_lowercase() {
        let generator = CodeGenerator::new(&config(10, 4), true, vec![]);
        for _ in 0..100 {
            let code = generator.generate();
            assert_eq!(code, code.to_lowercase());
        }
    }

    #[tokio::test]
    async fn test_allocate_retries_on_conflict() {
        let generator = CodeGenerator::new(&config(6, 5), false, vec![]);
        let calls = AtomicU32::new(0);

        let code = generator
            .allocate(|candidate| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ShortlinkError::conflict("taken"))
                    } else {
                        Ok(candidate)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(code.len(), 6);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_allocate_exhausted() {
        let generator = CodeGenerator::new(&config(1, 3), false, vec![]);
        let calls = AtomicU32::new(0);

        let result: Result<String> = generator
            .allocate(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ShortlinkError::conflict("taken")) }
            })
            .await;

        assert!(matches!(result, Err(ShortlinkError::Exhausted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_allocate_propagates_store_errors() {
        let generator = CodeGenerator::new(&config(6, 5), false, vec![]);
        let calls = AtomicU32::new(0);

        let result: Result<String> = generator
            .allocate(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ShortlinkError::store_unavailable("down")) }
            })
            .await;

        assert!(matches!(result, Err(ShortlinkError::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_allocations_are_distinct() {
        let generator = std::sync::Arc::new(CodeGenerator::new(&config(2, 50), false, vec![]));

        // 内存中的"原子插入"，用 HashSet 模拟主键约束；预先占用一批短码
        let mut existing = HashSet::new();
        while existing.len() < 500 {
            existing.insert(generator.generate());
        }
        let taken = std::sync::Arc::new(Mutex::new(existing.clone()));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let taken = std::sync::Arc::clone(&taken);
            let generator = std::sync::Arc::clone(&generator);
            handles.push(tokio::spawn(async move {
                generator
                    .allocate(|candidate| {
                        let taken = std::sync::Arc::clone(&taken);
                        async move {
                            if taken.lock().unwrap().insert(candidate.clone()) {
                                Ok(candidate)
                            } else {
                                Err(ShortlinkError::conflict("taken"))
                            }
                        }
                    })
                    .await
            }));
        }

        let mut codes = HashSet::new();
        for h in handles {
            let code = h.await.unwrap().unwrap();
            assert!(!existing.contains(&code), "reissued taken code {}", code);
            assert!(codes.insert(code));
        }
        assert_eq!(codes.len(), 50);
        assert_eq!(taken.lock().unwrap().len(), 550);
    }

    #[tokio::test]
    async fn test_reserved_candidates_are_skipped() {
        let generator = CodeGenerator::new(&config(1, 2000), true, vec![]);
        let reserved: Vec<String> = BASE36_LOWER[1..]
            .iter()
            .map(|b| (*b as char).to_string())
            .collect();
        let generator = CodeGenerator {
            reserved,
            ..generator
        };

        let code = generator
            .allocate(|candidate| async move { Ok(candidate) })
            .await
            .unwrap();
        assert_eq!(code, "a");
    }
}
