//! Errors that abort a document conversion.

use crate::handler::{CollectionError, RenderError};

/// Fatal autodoc error.
#[derive(Debug, thiserror::Error)]
pub enum AutodocError {
    /// The handler could not collect data for an identifier.
    #[error("Could not collect '{identifier}' on page {}", .page.as_deref().unwrap_or("<none>"))]
    Collection {
        /// Identifier written after `:::`.
        identifier: String,
        /// Page being converted, if known.
        page: Option<String>,
        /// Handler-side cause.
        #[source]
        source: CollectionError,
    },
    /// A template is missing for the active theme.
    #[error("Template '{template}' not found for '{handler}' handler and theme '{theme}'")]
    TemplateMissing {
        /// Missing template name.
        template: String,
        /// Handler that asked for it.
        handler: String,
        /// Active theme.
        theme: String,
    },
    /// Rendering failed for another reason.
    #[error("Could not render '{identifier}' with '{handler}' handler")]
    Render {
        /// Identifier written after `:::`.
        identifier: String,
        /// Handler that failed.
        handler: String,
        /// Handler-side cause.
        #[source]
        source: RenderError,
    },
    /// No factory is registered under this handler name.
    #[error("Unknown handler '{0}'")]
    UnknownHandler(String),
}
