//! Form-encoded and multipart body decoding.

use std::collections::BTreeMap;

use anyhow::Result;
use axum::body::Bytes;
use futures::stream;

use super::MultipartSummary;

/// Decode `application/x-www-form-urlencoded` into a flat map.
///
/// Duplicate field names keep the last value, consistent with standard form
/// decoding.
pub fn parse_urlencoded(body: &[u8]) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(body)
        .into_owned()
        .collect()
}

/// Reduce a multipart body to its field values and uploaded file names.
///
/// File contents are read to advance the parser but are not retained.
pub async fn parse_multipart(content_type: &str, body: Bytes) -> Result<MultipartSummary> {
    let boundary = multer::parse_boundary(content_type)?;
    let body_stream = stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(body_stream, boundary);

    let mut summary = MultipartSummary::default();
    while let Some(field) = multipart.next_field().await? {
        if let Some(file_name) = field.file_name() {
            summary.files.push(file_name.to_string());
            continue;
        }
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let value = field.text().await?;
        summary.form_data.insert(name, value);
    }
    Ok(summary)
}
