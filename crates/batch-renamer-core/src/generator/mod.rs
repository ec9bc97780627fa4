mod openai;

use crate::error::Result;
use crate::prompt::GenerationRequest;

pub use openai::{OpenAiCompatibleGenerator, KNOWN_MODELS};

/// Anything that can turn a rename request into a free-form text reply.
///
/// Calls are blocking from the worker's point of view and must give up
/// after a bounded time; a failure here fails the whole batch, never the run.
pub trait NameGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

impl<T: NameGenerator + ?Sized> NameGenerator for Box<T> {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        (**self).generate(request)
    }
}
