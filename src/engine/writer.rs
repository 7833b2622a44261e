//! The serialized write lane.
//!
//! All index mutation happens on one dedicated thread draining a FIFO
//! channel, so writes need no fine-grained locking inside the radix tree or
//! the numeric maps: acceptance order is application order. Readers run
//! concurrently under the read side of the state lock.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::RwLock;
use serde_json::Value;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::language::Language;
use crate::document::Ordinal;
use crate::engine::EngineState;
use crate::error::{FalcataError, Result};

/// A unit of work for the writer.
pub(crate) enum WriteOp {
    /// Apply an accepted insert.
    Insert {
        ordinal: Ordinal,
        id: String,
        document: Value,
        language: Language,
    },
    /// Apply a delete and acknowledge completion.
    Delete {
        ordinal: Ordinal,
        id: String,
        ack: Sender<Result<()>>,
    },
    /// Acknowledge once every previously enqueued op has been applied.
    Flush { ack: Sender<()> },
    /// Stop the writer.
    Shutdown,
}

/// Handle to the writer thread.
pub(crate) struct WriterLane {
    tx: Sender<WriteOp>,
    handle: Option<JoinHandle<()>>,
}

impl WriterLane {
    /// Spawn the writer over the shared engine state.
    pub(crate) fn spawn(
        state: Arc<RwLock<EngineState>>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Result<Self> {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("falcata-writer".to_string())
            .spawn(move || drain(rx, state, analyzer))
            .map_err(|e| FalcataError::engine(format!("failed to spawn the writer: {e}")))?;

        Ok(WriterLane {
            tx,
            handle: Some(handle),
        })
    }

    /// Enqueue a write. Fails only when the writer is gone.
    pub(crate) fn submit(&self, op: WriteOp) -> Result<()> {
        self.tx
            .send(op)
            .map_err(|_| FalcataError::engine("writer lane is shut down"))
    }

    /// Block until every previously enqueued op has been applied.
    pub(crate) fn flush(&self) {
        let (ack, done) = bounded(1);
        if self.submit(WriteOp::Flush { ack }).is_ok() {
            let _ = done.recv();
        }
    }

    /// Stop the writer and wait for it to exit.
    pub(crate) fn shutdown(&mut self) {
        let _ = self.tx.send(WriteOp::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WriterLane {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn drain(rx: Receiver<WriteOp>, state: Arc<RwLock<EngineState>>, analyzer: Arc<dyn Analyzer>) {
    while let Ok(op) = rx.recv() {
        match op {
            WriteOp::Insert {
                ordinal,
                id,
                document,
                language,
            } => {
                let tokenize = |text: &str| analyzer.analyze(text, language);
                let mut state = state.write();
                match state.indexes.insert_document(ordinal, &document, &tokenize) {
                    Ok(()) => state.docs.insert(ordinal, id, document, language),
                    Err(error) => {
                        // Fatal for the item: the id is dropped. Validation
                        // should have made this unreachable.
                        state.registry.remove(&id);
                        log::error!("dropping insert of document {id}: {error}");
                    }
                }
            }
            WriteOp::Delete { ordinal, id, ack } => {
                let result = apply_delete(&state, &analyzer, ordinal, &id);
                let _ = ack.send(result);
            }
            WriteOp::Flush { ack } => {
                let _ = ack.send(());
            }
            WriteOp::Shutdown => break,
        }
    }
}

fn apply_delete(
    state: &RwLock<EngineState>,
    analyzer: &Arc<dyn Analyzer>,
    ordinal: Ordinal,
    id: &str,
) -> Result<()> {
    let mut state = state.write();

    let Some(stored) = state.docs.get(ordinal).cloned() else {
        // Accepted but already removed by an earlier delete of the same id.
        return Err(FalcataError::doc_id_does_not_exist(id));
    };

    // Postings go first so the indices never reference a document the table
    // has already forgotten. The sweep covers every field even when a
    // posting is missing, so evicting the table entry below is safe on the
    // failure path too.
    let tokenize = |text: &str| analyzer.analyze(text, stored.language);
    let removal = state
        .indexes
        .remove_document(ordinal, id, &stored.document, &tokenize);

    state.docs.remove(ordinal);
    state.registry.remove(id);

    removal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::StandardAnalyzer;
    use crate::engine::EngineState;
    use crate::schema::Schema;
    use serde_json::json;

    fn state_for(schema: &Schema) -> Arc<RwLock<EngineState>> {
        Arc::new(RwLock::new(EngineState::for_schema(schema)))
    }

    fn lane_for(state: &Arc<RwLock<EngineState>>) -> WriterLane {
        WriterLane::spawn(state.clone(), Arc::new(StandardAnalyzer::new())).unwrap()
    }

    #[test]
    fn test_inserts_apply_in_acceptance_order() {
        let schema = Schema::builder().text("title").build();
        let state = state_for(&schema);
        let mut lane = lane_for(&state);

        for i in 0..20u32 {
            let id = format!("doc-{i}");
            let ordinal = state.write().registry.allocate(id.clone()).unwrap();
            assert_eq!(ordinal, i);
            lane.submit(WriteOp::Insert {
                ordinal,
                id,
                document: json!({ "title": format!("book {i}") }),
                language: Language::English,
            })
            .unwrap();
        }
        lane.flush();

        {
            let state = state.read();
            assert_eq!(state.docs.len(), 20);
            assert_eq!(state.docs.get(7).unwrap().id, "doc-7");
        }

        lane.shutdown();
    }

    #[test]
    fn test_delete_acknowledges_and_cleans_up() {
        let schema = Schema::builder().text("title").build();
        let state = state_for(&schema);
        let mut lane = lane_for(&state);

        let ordinal = state.write().registry.allocate("doc-0".to_string()).unwrap();
        lane.submit(WriteOp::Insert {
            ordinal,
            id: "doc-0".to_string(),
            document: json!({ "title": "lyra" }),
            language: Language::English,
        })
        .unwrap();

        let (ack, done) = bounded(1);
        lane.submit(WriteOp::Delete {
            ordinal,
            id: "doc-0".to_string(),
            ack,
        })
        .unwrap();
        done.recv().unwrap().unwrap();

        {
            let state = state.read();
            assert!(state.docs.is_empty());
            assert!(state.registry.ordinal_of("doc-0").is_none());
            assert!(state
                .indexes
                .text_index("title")
                .unwrap()
                .find_exact("lyra")
                .is_empty());
        }

        lane.shutdown();
    }

    #[test]
    fn test_delete_of_missing_ordinal_reports_unknown_id() {
        let schema = Schema::builder().text("title").build();
        let state = state_for(&schema);
        let mut lane = lane_for(&state);

        let (ack, done) = bounded(1);
        lane.submit(WriteOp::Delete {
            ordinal: 41,
            id: "ghost".to_string(),
            ack,
        })
        .unwrap();

        let err = done.recv().unwrap().unwrap_err();
        match err {
            FalcataError::DocIdDoesNotExist { id } => assert_eq!(id, "ghost"),
            other => panic!("unexpected error: {other}"),
        }

        lane.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let schema = Schema::builder().text("title").build();
        let state = state_for(&schema);
        let mut lane = lane_for(&state);
        lane.shutdown();

        let result = lane.submit(WriteOp::Flush { ack: bounded(1).0 });
        assert!(result.is_err());
    }
}
