//! Arithmetic captcha challenges backed by an in-process TTL cache.
//!
//! A challenge is issued under a random key and must be answered within the
//! configured window. Verification consumes the entry, so each challenge is
//! single-use regardless of whether the answer was right.

use moka::future::Cache;
use rand::RngExt;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::CaptchaResponse;

/// Upper bound on outstanding challenges.
const MAX_PENDING: u64 = 10_000;

#[derive(Clone)]
pub struct CaptchaService {
    answers: Cache<String, String>,
}

impl CaptchaService {
    pub fn new(ttl_secs: u64) -> Self {
        let answers = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .max_capacity(MAX_PENDING)
            .build();

        Self { answers }
    }

    /// Issue a new challenge.
    pub async fn issue(&self) -> CaptchaResponse {
        let mut rng = rand::rng();
        let a: i32 = rng.random_range(1..=9);
        let b: i32 = rng.random_range(1..=9);
        // Subtraction keeps the larger operand first so answers stay
        // non-negative.
        let (challenge, answer) = if rng.random_range(0..2) == 0 {
            (format!("{} + {} = ?", a, b), a + b)
        } else {
            let (hi, lo) = (a.max(b), a.min(b));
            (format!("{} - {} = ?", hi, lo), hi - lo)
        };

        let key = Uuid::new_v4().to_string();
        self.answers.insert(key.clone(), answer.to_string()).await;

        CaptchaResponse { key, challenge }
    }

    /// Check an answer, consuming the challenge.
    pub async fn verify(&self, key: &str, answer: &str) -> AppResult<()> {
        let expected = self
            .answers
            .remove(&key.to_string())
            .await
            .ok_or_else(|| AppError::Validation("Captcha expired or unknown".to_string()))?;

        if expected != answer.trim() {
            return Err(AppError::Validation("Captcha answer incorrect".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn correct_answer_verifies_once() {
        let service = CaptchaService::new(60);
        let issued = service.issue().await;

        // recompute the expected answer from the challenge text
        let parts: Vec<&str> = issued.challenge.split_whitespace().collect();
        let a: i32 = parts[0].parse().unwrap();
        let b: i32 = parts[2].parse().unwrap();
        let answer = if parts[1] == "+" { a + b } else { a - b };

        assert!(
            service
                .verify(&issued.key, &answer.to_string())
                .await
                .is_ok()
        );
        // consumed: second verification fails even with the right answer
        assert!(
            service
                .verify(&issued.key, &answer.to_string())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn wrong_answer_fails_and_consumes() {
        let service = CaptchaService::new(60);
        let issued = service.issue().await;

        assert!(service.verify(&issued.key, "999").await.is_err());
        assert!(service.verify(&issued.key, "999").await.is_err());
    }

    #[tokio::test]
    async fn unknown_key_fails() {
        let service = CaptchaService::new(60);
        assert!(service.verify("no-such-key", "1").await.is_err());
    }
}
