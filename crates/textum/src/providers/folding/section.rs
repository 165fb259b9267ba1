use lsp_types::{FoldingRange, FoldingRangeKind, FoldingRangeParams};

use crate::providers::{FeatureProvider, FeatureRequest, ProviderError};

/// Folds each section up to the start of the next section of equal or
/// higher level.
pub struct SectionFoldingProvider;

impl FeatureProvider for SectionFoldingProvider {
    type Params = FoldingRangeParams;
    type Output = Vec<FoldingRange>;

    fn execute(
        &self,
        request: &FeatureRequest<FoldingRangeParams>,
    ) -> Result<Vec<FoldingRange>, ProviderError> {
        Ok(request
            .document()
            .tree
            .sections
            .iter()
            .filter_map(|section| {
                let start_line = section.full_range.start.line;
                let end = section.full_range.end;
                // A section ending exactly at a successor's line start should
                // not swallow that successor's heading line.
                let end_line = if end.character == 0 {
                    end.line.saturating_sub(1)
                } else {
                    end.line
                };
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
