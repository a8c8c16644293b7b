use crate::error::LlmError;
use std::future::Future;

/// Optional language-model collaborator used by the scenario translator.
///
/// Absence is the normal case; callers hold `Option<impl LlmProvider>` and fall back to the
/// deterministic translation path when `is_available` is false or completion fails.
pub trait LlmProvider
where
    Self: Send + Sync,
{
    fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    fn is_available(&self) -> bool;
}
