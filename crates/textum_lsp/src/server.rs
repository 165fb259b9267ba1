use std::sync::Arc;

use serde::Deserialize;
use textum::{FeatureProvider, FeatureRequest};
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DocumentLink, DocumentLinkOptions, DocumentLinkParams, DocumentSymbolParams,
    DocumentSymbolResponse, FoldingRange, FoldingRangeParams, FoldingRangeProviderCapability,
    InitializeParams, InitializeResult, InitializedParams, MessageType, OneOf, RenameParams,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
    WorkspaceEdit,
};
use tower_lsp::{LanguageServer, LspService, Server};

use crate::state::ServerState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionConfig {
    max_items: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TextumConfig {
    completion: Option<CompletionConfig>,
}

pub(crate) struct Backend {
    pub(crate) client: tower_lsp::Client,
    pub(crate) state: Arc<Mutex<ServerState>>,
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                document_symbol_provider: Some(OneOf::Left(true)),
                document_link_provider: Some(DocumentLinkOptions {
                    resolve_provider: Some(false),
                    work_done_progress_options: Default::default(),
                }),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec!["\\".to_string(), "{".to_string()]),
                    ..CompletionOptions::default()
                }),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                rename_provider: Some(OneOf::Left(true)),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "textum-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "textum-lsp initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let config: TextumConfig = match serde_json::from_value(params.settings) {
            Ok(config) => config,
            Err(err) => {
                self.client
                    .log_message(
                        MessageType::WARNING,
                        format!("failed to parse configuration: {err}"),
                    )
                    .await;
                return;
            }
        };
        if let Some(max_items) = config.completion.and_then(|c| c.max_items) {
            let mut state = self.state.lock().await;
            state.completion.set_limit(max_items);
        }
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let mut state = self.state.lock().await;
        if let Err(err) = state
            .workspace
            .open(doc.uri, &doc.language_id, doc.text, doc.version)
        {
            // The already-open document stays authoritative.
            tracing::warn!(%err, "ignoring didOpen");
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let mut state = self.state.lock().await;
        if let Err(err) = state
            .workspace
            .update(&uri, &params.content_changes, version)
        {
            tracing::warn!(%err, "ignoring didChange");
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let mut state = self.state.lock().await;
        state.workspace.close(&params.text_document.uri);
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let state = self.state.lock().await;
        let symbols = state
            .workspace
            .get(&params.text_document.uri)
            .map(|doc| doc.document_symbols())
            .unwrap_or_default();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        let state = self.state.lock().await;
        let links = state
            .workspace
            .get(&params.text_document.uri)
            .map(|doc| doc.document_links(&state.workspace))
            .unwrap_or_default();
        Ok(Some(links))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri.clone();
        let state = self.state.lock().await;
        let documents = state.workspace.related(&uri);
        let Some(request) = FeatureRequest::new(params, documents) else {
            return Ok(Some(CompletionResponse::Array(Vec::new())));
        };
        let list = match state.completion.execute(&request) {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(%err, "completion failed");
                return Ok(Some(CompletionResponse::Array(Vec::new())));
            }
        };
        Ok(Some(CompletionResponse::List(list)))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let uri = params.text_document.uri.clone();
        let state = self.state.lock().await;
        let documents = state.workspace.related(&uri);
        let Some(request) = FeatureRequest::new(params, documents) else {
            return Ok(None);
        };
        match state.folding.execute(&request) {
            Ok(ranges) => Ok(Some(ranges)),
            Err(err) => {
                tracing::warn!(%err, "folding failed");
                Ok(None)
            }
        }
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri.clone();
        let state = self.state.lock().await;
        let documents = state.workspace.related(&uri);
        let Some(request) = FeatureRequest::new(params, documents) else {
            return Ok(None);
        };
        match state.rename.execute(&request) {
            Ok(edit) => Ok(edit),
            Err(err) => {
                tracing::warn!(%err, "rename failed");
                Ok(None)
            }
        }
    }
}

pub async fn run() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::new(|client| Backend {
        client,
        state: Arc::new(Mutex::new(ServerState::default())),
    });
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_parses_completion_cap() {
        let settings = serde_json::json!({ "completion": { "maxItems": 25 } });
        let config: TextumConfig = serde_json::from_value(settings).unwrap();
        assert_eq!(config.completion.unwrap().max_items, Some(25));
    }

    #[test]
    fn configuration_tolerates_missing_sections() {
        let config: TextumConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(config.completion.is_none());
    }
}
