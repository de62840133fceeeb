//! Concatenate the pages of every item into one document
//!
//! Sources are processed strictly in order: item N+1 is loaded only after the
//! pages of item N have been copied, so the output page order is the item
//! order times each source's own page order. Any load failure aborts the
//! whole merge and nothing is produced.

use crate::types::{DocumentItem, MergeError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

/// Default name offered for the merged output
pub const MERGED_FILE_NAME: &str = "merged.pdf";

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Result of a merge, ready to be written out
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub file_name: String,
}

impl MergedDocument {
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(path, &self.bytes).await?;
        Ok(())
    }
}

/// Progress after each source has been copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeProgress {
    pub current: usize,
    pub total: usize,
    pub name: String,
}

/// Parse a source, mapping failures to the user-facing error taxonomy
pub fn load_source(name: &str, bytes: &[u8]) -> Result<Document> {
    match Document::load_mem(bytes) {
        Ok(doc) if doc.is_encrypted() => Err(MergeError::Encrypted {
            name: name.to_string(),
        }),
        Ok(doc) => Ok(doc),
        Err(e) if looks_encrypted(&e) => Err(MergeError::Encrypted {
            name: name.to_string(),
        }),
        Err(source) => Err(MergeError::Parse {
            name: name.to_string(),
            source,
        }),
    }
}

fn looks_encrypted(err: &lopdf::Error) -> bool {
    let message = err.to_string().to_ascii_lowercase();
    ["encrypt", "decrypt", "password"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Accumulates pages from several documents into one output document
pub struct MergeBuilder {
    output: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl MergeBuilder {
    pub fn new() -> Self {
        let mut output = Document::with_version("1.5");
        let pages_id = output.new_object_id();
        Self {
            output,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Move all pages of `source` to the end of the output, in their original order.
    ///
    /// Returns the number of pages appended.
    pub fn append(&mut self, mut source: Document) -> Result<usize> {
        source.renumber_objects_with(self.output.max_id + 1);

        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &page_id in &source_pages {
            inherit_page_attributes(&mut source, page_id);
        }

        let source_max = source
            .objects
            .keys()
            .map(|id| id.0)
            .max()
            .unwrap_or(0)
            .max(source.max_id);

        for (id, object) in std::mem::take(&mut source.objects) {
            if is_tree_node(&object) {
                continue;
            }
            self.output.objects.insert(id, object);
        }

        for &page_id in &source_pages {
            if let Ok(page) = self
                .output
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
            {
                page.set("Parent", Object::Reference(self.pages_id));
            }
        }

        self.output.max_id = self.output.max_id.max(source_max);
        self.page_ids.extend_from_slice(&source_pages);
        Ok(source_pages.len())
    }

    /// Build the page tree and catalog for the accumulated pages
    pub fn finish(mut self) -> Result<Document> {
        if self.page_ids.is_empty() {
            return Err(MergeError::NoDocuments);
        }

        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(self.page_ids.len() as i64)),
        ]);
        self.output
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.output.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.output.trailer.set("Root", catalog_id);

        Ok(self.output)
    }
}

impl Default for MergeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn is_tree_node(object: &Object) -> bool {
    let Ok(dict) = object.as_dict() else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog") | Ok(b"Pages")
    )
}

/// Copy inheritable attributes from ancestors onto the page so it survives
/// being detached from its original page tree
fn inherit_page_attributes(doc: &mut Document, page_id: ObjectId) {
    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();

    {
        let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
            return;
        };
        let mut missing: Vec<&[u8]> = INHERITABLE_KEYS
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth >= MAX_TREE_DEPTH {
                break;
            }
            let Ok(node) = doc.get_object(parent_id).and_then(Object::as_dict) else {
                break;
            };
            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }
    }

    if inherited.is_empty() {
        return;
    }
    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}

/// Serialize a document to bytes
pub fn to_bytes(mut doc: Document) -> Result<Vec<u8>> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}

/// Merge already-parsed documents in the given order
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        return Err(MergeError::NoDocuments);
    }
    let mut builder = MergeBuilder::new();
    for doc in documents {
        builder.append(doc)?;
    }
    builder.finish()
}

/// Merge every item, in order, into a single document.
///
/// `on_progress` is called after each item's pages have been copied.
pub async fn merge_items<F>(items: &[DocumentItem], mut on_progress: F) -> Result<MergedDocument>
where
    F: FnMut(MergeProgress),
{
    if items.is_empty() {
        return Err(MergeError::NoDocuments);
    }

    let total = items.len();
    let mut builder = MergeBuilder::new();

    for (index, item) in items.iter().enumerate() {
        let name = item.source.name.clone();
        let bytes = item.source.bytes.clone();
        let doc = tokio::task::spawn_blocking(move || load_source(&name, &bytes)).await??;
        if doc.get_pages().is_empty() {
            return Err(MergeError::InvalidInput {
                name: item.source.name.clone(),
                reason: "document has no pages".to_string(),
            });
        }

        let appended = builder.append(doc)?;
        log::debug!("Copied {appended} page(s) from {}", item.source.name);

        on_progress(MergeProgress {
            current: index + 1,
            total,
            name: item.source.name.clone(),
        });
    }

    let page_count = builder.page_count();
    let bytes = tokio::task::spawn_blocking(move || builder.finish().and_then(to_bytes)).await??;

    log::info!("Merged {total} file(s) into {page_count} page(s)");

    Ok(MergedDocument {
        bytes,
        page_count,
        file_name: MERGED_FILE_NAME.to_string(),
    })
}
