use lsp_types::{FoldingRange, FoldingRangeKind, FoldingRangeParams};

use crate::providers::{FeatureProvider, FeatureRequest, ProviderError};

/// One folding range per matched environment, collapsing the body between
/// `\begin` and `\end`.
pub struct EnvironmentFoldingProvider;

impl FeatureProvider for EnvironmentFoldingProvider {
    type Params = FoldingRangeParams;
    type Output = Vec<FoldingRange>;

    fn execute(
        &self,
        request: &FeatureRequest<FoldingRangeParams>,
    ) -> Result<Vec<FoldingRange>, ProviderError> {
        Ok(request
            .document()
            .tree
            .environments
            .iter()
            .filter_map(|env| {
                let start_line = env.full_range.start.line;
                // Leave the `\end` line visible.
                let end_line = env.full_range.end.line.saturating_sub(1);
                if end_line <= start_line {
                    return None;
                }
                Some(FoldingRange {
                    start_line,
                    end_line,
                    kind: Some(FoldingRangeKind::Region),
                    ..FoldingRange::default()
                })
            })
            .collect())
    }
}
