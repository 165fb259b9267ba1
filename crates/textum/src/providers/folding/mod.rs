use lsp_types::{FoldingRange, FoldingRangeParams};

use super::ConcatProvider;

mod environment;
mod section;

pub use environment::EnvironmentFoldingProvider;
pub use section::SectionFoldingProvider;

pub fn folding_provider() -> ConcatProvider<FoldingRangeParams, FoldingRange> {
    ConcatProvider::new(vec![
        Box::new(EnvironmentFoldingProvider),
        Box::new(SectionFoldingProvider),
    ])
}
