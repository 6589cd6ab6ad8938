//! Content model builders.
//!
//! One builder per node kind. Builders do no I/O: the tree fetches handles
//! and bytes from the library and passes them in together with the current
//! time, so every function here is deterministic.
//!
//! Directory listings are sorted by name, ties broken by path.

use crate::model::{Content, ContentModel};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use contents_core::{
    BundleHandle, ContentFormat, ContentType, ContentsError, FileClass, FileHandle, Result,
};
use contents_notebook::Notebook;
use std::collections::BTreeSet;

fn directory(
    name: &str,
    path: &str,
    writable: bool,
    now: DateTime<Utc>,
    children: Option<Vec<ContentModel>>,
) -> ContentModel {
    let content = children.map(|mut children| {
        sort_listing(&mut children);
        Content::Directory(children)
    });
    ContentModel {
        name: name.to_string(),
        path: path.to_string(),
        kind: ContentType::Directory,
        format: content.as_ref().map(|_| ContentFormat::Json),
        mimetype: None,
        last_modified: now,
        created: now,
        writable,
        content,
    }
}

/// Sorts directory entries by name, then by path.
pub fn sort_listing(entries: &mut [ContentModel]) {
    entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
}

/// Builds the listing entry of a source.
#[must_use]
pub fn source_entry(source: &str, now: DateTime<Utc>) -> ContentModel {
    directory(source, source, false, now, None)
}

/// Builds the listing entry of a bundle.
#[must_use]
pub fn bundle_entry(bundle: &BundleHandle, now: DateTime<Utc>) -> ContentModel {
    directory(bundle.vname(), bundle.key.as_str(), true, now, None)
}

/// Builds the listing entry of a file or notebook.
#[must_use]
pub fn file_entry(file: &FileHandle, now: DateTime<Utc>) -> ContentModel {
    let kind = file.record.class.content_type();
    let timestamp = file.record.modified.unwrap_or(now);
    ContentModel {
        name: file.name().to_string(),
        path: file.path(),
        kind,
        format: None,
        mimetype: (kind == ContentType::File).then(|| file.record.mime_type.clone()),
        last_modified: timestamp,
        created: timestamp,
        writable: kind == ContentType::Notebook,
        content: None,
    }
}

/// Builds the root model, listing every distinct source.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use contents_tree::builders::root_model;
///
/// let model = root_model(&[], true, Utc::now());
/// assert_eq!(model.path, "");
/// assert_eq!(model.children().map(<[_]>::len), Some(0));
/// ```
#[must_use]
pub fn root_model(bundles: &[BundleHandle], content: bool, now: DateTime<Utc>) -> ContentModel {
    let children = content.then(|| {
        bundles
            .iter()
            .map(BundleHandle::source)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|source| source_entry(source, now))
            .collect()
    });
    directory("", "", false, now, children)
}

/// Builds a source model, listing the bundles of that source.
#[must_use]
pub fn source_model(
    source: &str,
    bundles: &[BundleHandle],
    content: bool,
    now: DateTime<Utc>,
) -> ContentModel {
    let children = content.then(|| {
        bundles
            .iter()
            .filter(|bundle| bundle.source() == source)
            .map(|bundle| bundle_entry(bundle, now))
            .collect()
    });
    directory(source, source, false, now, children)
}

/// Builds a bundle model, listing its files.
#[must_use]
pub fn bundle_model(
    bundle: &BundleHandle,
    files: Option<&[FileHandle]>,
    now: DateTime<Utc>,
) -> ContentModel {
    let children = files.map(|files| files.iter().map(|file| file_entry(file, now)).collect());
    directory(bundle.vname(), bundle.key.as_str(), true, now, children)
}

/// Builds a plain file model.
///
/// `content` is the decoded payload from [`file_content`], if requested.
#[must_use]
pub fn file_model(
    file: &FileHandle,
    content: Option<(Content, ContentFormat)>,
    now: DateTime<Utc>,
) -> ContentModel {
    let mut model = file_entry(file, now);
    model.kind = ContentType::File;
    model.mimetype = Some(file.record.mime_type.clone());
    model.writable = false;
    if let Some((content, format)) = content {
        model.format = Some(format);
        model.content = Some(content);
    }
    model
}

/// Builds a notebook model.
#[must_use]
pub fn notebook_model(
    file: &FileHandle,
    notebook: Option<Notebook>,
    now: DateTime<Utc>,
) -> ContentModel {
    let mut model = file_entry(file, now);
    model.kind = ContentType::Notebook;
    model.mimetype = None;
    model.writable = true;
    if let Some(notebook) = notebook {
        model.format = Some(ContentFormat::Json);
        model.content = Some(Content::Notebook(notebook));
    }
    model
}

/// Decodes stored bytes of a plain file in the requested format.
///
/// Without a format, UTF-8 text is tried first with a base64 fallback.
///
/// # Errors
///
/// Returns [`ContentsError::BadType`] if text was requested for bytes that
/// are not UTF-8, or if JSON was requested for a plain file.
///
/// # Examples
///
/// ```
/// use contents_core::ContentFormat;
/// use contents_tree::builders::file_content;
///
/// let (_, format) = file_content(b"hello".to_vec(), None, "a/b-1/c.txt").unwrap();
/// assert_eq!(format, ContentFormat::Text);
///
/// let (_, format) = file_content(vec![0xff, 0xfe], None, "a/b-1/c.bin").unwrap();
/// assert_eq!(format, ContentFormat::Base64);
/// ```
pub fn file_content(
    bytes: Vec<u8>,
    format: Option<ContentFormat>,
    path: &str,
) -> Result<(Content, ContentFormat)> {
    match format {
        Some(ContentFormat::Text) => String::from_utf8(bytes)
            .map(|text| (Content::Text(text), ContentFormat::Text))
            .map_err(|_| ContentsError::BadType {
                path: path.to_string(),
                reason: "file is not UTF-8 encoded".to_string(),
            }),
        Some(ContentFormat::Base64) => Ok((
            Content::Base64(STANDARD.encode(bytes)),
            ContentFormat::Base64,
        )),
        Some(ContentFormat::Json) => Err(ContentsError::BadType {
            path: path.to_string(),
            reason: "plain files cannot be read as json".to_string(),
        }),
        None => Ok(match String::from_utf8(bytes) {
            Ok(text) => (Content::Text(text), ContentFormat::Text),
            Err(e) => (
                Content::Base64(STANDARD.encode(e.into_bytes())),
                ContentFormat::Base64,
            ),
        }),
    }
}

/// Returns the storage class used for a new file of the given type.
#[must_use]
pub const fn class_for(kind: ContentType) -> FileClass {
    match kind {
        ContentType::Notebook => FileClass::Notebook,
        ContentType::File | ContentType::Directory => FileClass::Plain,
    }
}
