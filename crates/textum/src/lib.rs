//! Orchestration core of a TeX language server: the open-document workspace,
//! include/import dependency resolution, and the provider-aggregation
//! framework that composes independent analyzers into one deterministic
//! response per request.

pub mod document;
pub mod providers;
pub mod syntax;
pub mod workspace;

pub use document::{Document, LanguageKind};
pub use providers::completion::completion_provider;
pub use providers::folding::folding_provider;
pub use providers::rename::rename_provider;
pub use providers::{
    ChoiceProvider, ConcatProvider, FeatureProvider, FeatureRequest, OrderedCompletionProvider,
    ProviderError, COMPLETION_LIMIT,
};
pub use syntax::SyntaxTree;
pub use workspace::{FileProbe, OsFileProbe, Workspace, WorkspaceError};
