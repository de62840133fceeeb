#![allow(dead_code)]

use image::RgbaImage;
use lopdf::{Dictionary, Document, EncryptionState, EncryptionVersion, Object, Permissions, Stream};
use pdf_merge::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build a PDF whose pages carry the text `<label>-<n>` in their content stream
pub fn create_test_pdf(label: &str, num_pages: usize) -> Vec<u8> {
    let mut doc = create_test_document(label, num_pages);
    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

/// `create_test_pdf`, RC4-encrypted. An empty `user_password` gives an
/// owner-only document that opens without a password.
pub fn create_encrypted_pdf(
    label: &str,
    num_pages: usize,
    user_password: &str,
    owner_password: &str,
) -> Vec<u8> {
    let mut doc = create_test_document(label, num_pages);
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::string_literal(b"0123456789abcdef".to_vec()),
            Object::string_literal(b"0123456789abcdef".to_vec()),
        ]),
    );
    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password,
        user_password,
        key_length: 128,
        permissions: Permissions::default(),
    })
    .unwrap();
    doc.encrypt(&state).unwrap();

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

fn create_test_document(label: &str, num_pages: usize) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for page_num in 1..=num_pages {
        let content = format!("BT /F1 12 Tf 50 700 Td ({label}-{page_num}) Tj ET");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Like `create_test_pdf`, but MediaBox lives on the page tree node only
pub fn create_inheriting_pdf(label: &str, num_pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for page_num in 1..=num_pages {
        let content = format!("BT ({label}-{page_num}) Tj ET");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(420),
                Object::Integer(595),
            ]),
        ),
        ("Resources", Object::Dictionary(Dictionary::new())),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

pub fn source(label: &str, num_pages: usize) -> SourceFile {
    SourceFile::new(format!("{label}.pdf"), create_test_pdf(label, num_pages))
}

/// Text labels of every page, in page order
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let text = String::from_utf8_lossy(&content).into_owned();
            let start = text.find('(').unwrap() + 1;
            let end = text[start..].find(')').unwrap() + start;
            text[start..end].to_string()
        })
        .collect()
}

/// Renderer that counts pages with lopdf and fails a fixed number of times first
pub struct MockRenderer {
    calls: AtomicUsize,
    fail_first: usize,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::failing(0)
    }

    pub fn failing(fail_first: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageRenderer for MockRenderer {
    fn render_page(&self, bytes: &[u8], page_index: usize, target_width: u32) -> Result<RenderedPage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(MergeError::Render(format!("simulated failure {}", call + 1)));
        }
        render_blank(bytes, page_index, target_width)
    }
}

fn render_blank(bytes: &[u8], page_index: usize, target_width: u32) -> Result<RenderedPage> {
    let doc = load_source("mock", bytes)?;
    let page_count = doc.get_pages().len();
    if page_index >= page_count {
        return Err(MergeError::Render(format!("no page {page_index}")));
    }
    let (width, height) = target_size(612.0, 792.0, target_width);
    Ok(RenderedPage {
        image: RgbaImage::new(width, height),
        page_index,
        page_count,
    })
}

/// Renderer that sets a cancel flag while rendering a given page,
/// optionally failing that page as well
pub struct CancellingRenderer {
    pub cancel: CancelFlag,
    pub cancel_on_page: usize,
    pub fail_cancelled_page: bool,
    pub rendered: Mutex<Vec<usize>>,
}

impl PageRenderer for CancellingRenderer {
    fn render_page(&self, bytes: &[u8], page_index: usize, target_width: u32) -> Result<RenderedPage> {
        self.rendered.lock().unwrap().push(page_index);
        if page_index == self.cancel_on_page {
            self.cancel.cancel();
            if self.fail_cancelled_page {
                return Err(MergeError::Render(format!("page {page_index} failed")));
            }
        }
        render_blank(bytes, page_index, target_width)
    }
}

/// Fast retry policy so tests do not sleep for long
pub fn fast_options() -> ThumbnailOptions {
    ThumbnailOptions {
        width: 120,
        retry: RetryPolicy {
            max_attempts: 3,
            backoff_unit: std::time::Duration::from_millis(1),
        },
    }
}

pub fn fast_settings() -> BoardSettings {
    BoardSettings {
        thumbnail: ThumbnailSettings {
            width: 120,
            max_attempts: 3,
            backoff_ms: 1,
        },
        ..Default::default()
    }
}
