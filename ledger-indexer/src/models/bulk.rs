//! Bulk request body builder

use serde_json::json;
use std::io::Write;

use crate::core::error::IndexerResult;
use crate::core::traits::Indexable;

/// Writes documents as newline-delimited action/source pairs
pub struct BulkSink<W: Write> {
    out: W,
    prefix: String,
    documents: usize,
}

impl<W: Write> BulkSink<W> {
    pub fn new(out: W, prefix: impl Into<String>) -> Self {
        Self {
            out,
            prefix: prefix.into(),
            documents: 0,
        }
    }

    pub fn push<D: Indexable>(&mut self, doc: &D) -> IndexerResult<()> {
        let index = doc.index_name().qualified(&self.prefix);
        let action = match doc.document_id() {
            Some(id) => json!({ "index": { "_index": index, "_id": id } }),
            None => json!({ "index": { "_index": index } }),
        };
        serde_json::to_writer(&mut self.out, &action)?;
        self.out.write_all(b"\n")?;
        serde_json::to_writer(&mut self.out, doc)?;
        self.out.write_all(b"\n")?;
        self.documents += 1;
        Ok(())
    }

    pub fn push_all<D: Indexable>(&mut self, docs: &[D]) -> IndexerResult<()> {
        for doc in docs {
            self.push(doc)?;
        }
        Ok(())
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IndexName;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        id: Option<String>,
        value: u32,
    }

    impl Indexable for Sample {
        fn index_name(&self) -> IndexName {
            IndexName::Ledger
        }

        fn document_id(&self) -> Option<String> {
            self.id.clone()
        }
    }

    #[test]
    fn test_action_lines() {
        let mut sink = BulkSink::new(Vec::new(), "pre-");
        sink.push(&Sample {
            id: Some("42".to_string()),
            value: 1,
        })
        .unwrap();
        sink.push(&Sample { id: None, value: 2 }).unwrap();
        assert_eq!(sink.documents(), 2);

        let body = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        let action: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action, json!({ "index": { "_index": "pre-ledger", "_id": "42" } }));
        let source: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(source["value"], 1);
        let action: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(action, json!({ "index": { "_index": "pre-ledger" } }));
        assert!(body.ends_with('\n'));
    }
}
