//! Provider composition: independent analyzers behind one capability
//! interface, merged (or raced, for rename) into a single response.

use std::sync::Arc;

use lsp_types::{CompletionItem, CompletionList, CompletionParams};
use thiserror::Error;

use crate::document::{word_before, Document};

pub mod completion;
pub mod folding;
pub mod rename;

/// Failure of a single provider variant. Isolated by the combinators: the
/// sibling variants' results still make it into the response.
#[derive(Debug, Error)]
#[error("provider failed: {message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Immutable per-event value handed to every variant: the capability-specific
/// parameters plus the target document and its related set.
pub struct FeatureRequest<P> {
    params: P,
    documents: Vec<Arc<Document>>,
}

impl<P> FeatureRequest<P> {
    /// `documents` must start with the target document; `None` if empty.
    pub fn new(params: P, documents: Vec<Arc<Document>>) -> Option<Self> {
        if documents.is_empty() {
            return None;
        }
        Some(Self { params, documents })
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    /// The document the request targets.
    pub fn document(&self) -> &Document {
        &self.documents[0]
    }

    /// Target first, then the rest of the related set in traversal order.
    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }
}

/// One independent analyzer. Implementations hold no per-call mutable state,
/// so the combinators may invoke them in any order, any number of times.
pub trait FeatureProvider: Send + Sync {
    type Params;
    type Output;

    fn execute(&self, request: &FeatureRequest<Self::Params>)
        -> Result<Self::Output, ProviderError>;
}

type ListProvider<P, I> = Box<dyn FeatureProvider<Params = P, Output = Vec<I>>>;

/// Merge-all combinator: every variant runs against the same request and the
/// result sequences are concatenated in registration order. A failing variant
/// is logged and skipped; the aggregate itself never fails.
pub struct ConcatProvider<P, I> {
    providers: Vec<ListProvider<P, I>>,
}

impl<P, I> ConcatProvider<P, I> {
    pub fn new(providers: Vec<ListProvider<P, I>>) -> Self {
        Self { providers }
    }
}

impl<P, I> FeatureProvider for ConcatProvider<P, I> {
    type Params = P;
    type Output = Vec<I>;

    fn execute(&self, request: &FeatureRequest<P>) -> Result<Vec<I>, ProviderError> {
        let mut items = Vec::new();
        for provider in &self.providers {
            match provider.execute(request) {
                Ok(mut batch) => items.append(&mut batch),
                Err(err) => tracing::warn!(%err, "provider variant failed, skipping"),
            }
        }
        Ok(items)
    }
}

type OptionProvider<P, O> = Box<dyn FeatureProvider<Params = P, Output = Option<O>>>;

/// First-match combinator: variants are tried in registration order and the
/// first one producing a value wins. Used for rename, where exactly one
/// coherent edit set must come back.
pub struct ChoiceProvider<P, O> {
    providers: Vec<OptionProvider<P, O>>,
}

impl<P, O> ChoiceProvider<P, O> {
    pub fn new(providers: Vec<OptionProvider<P, O>>) -> Self {
        Self { providers }
    }
}

impl<P, O> FeatureProvider for ChoiceProvider<P, O> {
    type Params = P;
    type Output = Option<O>;

    fn execute(&self, request: &FeatureRequest<P>) -> Result<Option<O>, ProviderError> {
        for provider in &self.providers {
            match provider.execute(request) {
                Ok(Some(output)) => return Ok(Some(output)),
                Ok(None) => {}
                Err(err) => tracing::warn!(%err, "provider variant failed, skipping"),
            }
        }
        Ok(None)
    }
}

pub const COMPLETION_LIMIT: usize = 100;

/// Ordering stage over the merged completion items: deduplicate by label,
/// rank against the word at the cursor, cap the list and report whether the
/// cap was hit so the client can re-query with a longer prefix.
pub struct OrderedCompletionProvider {
    inner: ConcatProvider<CompletionParams, CompletionItem>,
    limit: usize,
}

impl OrderedCompletionProvider {
    pub fn new(inner: ConcatProvider<CompletionParams, CompletionItem>) -> Self {
        Self {
            inner,
            limit: COMPLETION_LIMIT,
        }
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
    }
}

impl FeatureProvider for OrderedCompletionProvider {
    type Params = CompletionParams;
    type Output = CompletionList;

    fn execute(
        &self,
        request: &FeatureRequest<CompletionParams>,
    ) -> Result<CompletionList, ProviderError> {
        let merged = self.inner.execute(request)?;
        let position = request.params().text_document_position.position;
        let query = word_before(&request.document().text, position);

        let mut seen = std::collections::HashSet::new();
        let mut scored: Vec<(i32, usize, CompletionItem)> = Vec::new();
        for (idx, item) in merged.into_iter().enumerate() {
            if !seen.insert(item.label.clone()) {
                continue;
            }
            scored.push((quality(&item.label, &query), idx, item));
        }
        scored.sort_by(|(score_a, idx_a, item_a), (score_b, idx_b, item_b)| {
            score_b
                .cmp(score_a)
                .then(idx_a.cmp(idx_b))
                .then(item_a.label.cmp(&item_b.label))
        });

        let is_incomplete = scored.len() > self.limit;
        scored.truncate(self.limit);
        Ok(CompletionList {
            is_incomplete,
            items: scored.into_iter().map(|(_, _, item)| item).collect(),
        })
    }
}

/// Deterministic match quality of a label against the typed word. Higher is
/// better; an empty query ranks everything equal.
fn quality(label: &str, query: &str) -> i32 {
    if query.is_empty() {
        return 1;
    }
    if label == query {
        return 5;
    }
    if label.starts_with(query) {
        return 4;
    }
    let label_lower = label.to_lowercase();
    let query_lower = query.to_lowercase();
    if label_lower.starts_with(&query_lower) {
        return 3;
    }
    if label.contains(query) {
        return 2;
    }
    if label_lower.contains(&query_lower) {
        return 1;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LanguageKind;
    use lsp_types::{
        PartialResultParams, Position, TextDocumentIdentifier, TextDocumentPositionParams, Url,
        WorkDoneProgressParams,
    };

    struct Fixed(Vec<String>);

    impl Fixed {
        fn labels(labels: &[&str]) -> Box<Self> {
            Box::new(Self(labels.iter().map(|s| s.to_string()).collect()))
        }
    }

    impl FeatureProvider for Fixed {
        type Params = CompletionParams;
        type Output = Vec<CompletionItem>;

        fn execute(
            &self,
            _request: &FeatureRequest<CompletionParams>,
        ) -> Result<Vec<CompletionItem>, ProviderError> {
            Ok(self
                .0
                .iter()
                .map(|label| CompletionItem {
                    label: label.clone(),
                    ..CompletionItem::default()
                })
                .collect())
        }
    }

    struct Failing;

    impl FeatureProvider for Failing {
        type Params = CompletionParams;
        type Output = Vec<CompletionItem>;

        fn execute(
            &self,
            _request: &FeatureRequest<CompletionParams>,
        ) -> Result<Vec<CompletionItem>, ProviderError> {
            Err(ProviderError::new("broken variant"))
        }
    }

    fn completion_request(text: &str, position: Position) -> FeatureRequest<CompletionParams> {
        let uri = Url::parse("file:///main.tex").unwrap();
        let document = Arc::new(Document::new(
            uri.clone(),
            LanguageKind::Markup,
            text.to_string(),
            0,
        ));
        let params = CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri },
                position,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: None,
        };
        FeatureRequest::new(params, vec![document]).unwrap()
    }

    #[test]
    fn concat_preserves_registration_order() {
        let aggregate =
            ConcatProvider::new(vec![Fixed::labels(&["b"]), Fixed::labels(&["a"])]);
        let request = completion_request("", Position::new(0, 0));
        let items = aggregate.execute(&request).unwrap();
        let labels: Vec<_> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, ["b", "a"]);
    }

    #[test]
    fn failing_variant_is_isolated() {
        let aggregate = ConcatProvider::new(vec![
            Fixed::labels(&["kept"]),
            Box::new(Failing),
            Fixed::labels(&["also"]),
        ]);
        let request = completion_request("", Position::new(0, 0));
        let items = aggregate.execute(&request).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn ordering_deduplicates_by_label() {
        let aggregate = ConcatProvider::new(vec![
            Fixed::labels(&["dup", "one"]),
            Fixed::labels(&["dup", "two"]),
        ]);
        let ordered = OrderedCompletionProvider::new(aggregate);
        let request = completion_request("", Position::new(0, 0));
        let list = ordered.execute(&request).unwrap();
        let labels: Vec<_> = list.items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, ["dup", "one", "two"]);
    }

    #[test]
    fn ordering_caps_and_reports_incomplete() {
        let many: Vec<String> = (0..150).map(|i| format!("item{i:03}")).collect();
        let ordered =
            OrderedCompletionProvider::new(ConcatProvider::new(vec![Box::new(Fixed(many))]));
        let request = completion_request("", Position::new(0, 0));
        let list = ordered.execute(&request).unwrap();
        assert!(list.is_incomplete);
        assert_eq!(list.items.len(), COMPLETION_LIMIT);
    }

    #[test]
    fn ordering_below_cap_is_complete() {
        let ordered = OrderedCompletionProvider::new(ConcatProvider::new(vec![Box::new(Fixed(
            (0..40).map(|_| "x".to_string()).collect(),
        ))]));
        let request = completion_request("", Position::new(0, 0));
        let list = ordered.execute(&request).unwrap();
        assert!(!list.is_incomplete);
        // All forty shared a label, so deduplication leaves one.
        assert_eq!(list.items.len(), 1);
    }

    #[test]
    fn ordering_prefers_prefix_matches() {
        let aggregate = ConcatProvider::new(vec![Fixed::labels(&[
            "tabular", "itemize", "item", "minipage",
        ])]);
        let ordered = OrderedCompletionProvider::new(aggregate);
        let request = completion_request("\\begin{item", Position::new(0, 11));
        let list = ordered.execute(&request).unwrap();
        let labels: Vec<_> = list.items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels[0], "item");
        assert_eq!(labels[1], "itemize");
    }

    #[test]
    fn choice_returns_first_match() {
        struct Named(Option<&'static str>);
        impl FeatureProvider for Named {
            type Params = ();
            type Output = Option<String>;
            fn execute(
                &self,
                _request: &FeatureRequest<()>,
            ) -> Result<Option<String>, ProviderError> {
                Ok(self.0.map(str::to_string))
            }
        }
        let choice = ChoiceProvider::new(vec![
            Box::new(Named(None)),
            Box::new(Named(Some("winner"))),
            Box::new(Named(Some("ignored"))),
        ]);
        let uri = Url::parse("file:///main.tex").unwrap();
        let doc = Arc::new(Document::new(
            uri,
            LanguageKind::Markup,
            String::new(),
            0,
        ));
        let request = FeatureRequest::new((), vec![doc]).unwrap();
        assert_eq!(choice.execute(&request).unwrap().as_deref(), Some("winner"));
    }

    #[test]
    fn empty_request_is_rejected() {
        assert!(FeatureRequest::new((), Vec::new()).is_none());
    }
}
