use thiserror::Error;

/// Failure of a page load
///
/// The collection is left exactly as it was before the load started.
#[derive(Error, Debug)]
pub enum LoadError<E> {
    #[error("Page fetch failed: {0}")]
    Source(E),
}

impl<E> LoadError<E> {
    /// The underlying source error
    pub fn into_source(self) -> E {
        match self {
            Self::Source(e) => e,
        }
    }
}
