// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Resolves the buffers and images a glTF document points at.

use std::path::{Path, PathBuf};

use base64::Engine;

use crate::error::ImportError;

/// Resolves external resources referenced by URI from within a glTF document.
pub trait ResourceResolver: Send + Sync {
    /// Resolves an external buffer URI to its binary data.
    fn resolve_buffer(&self, uri: &str) -> Result<Vec<u8>, ImportError>;

    /// Resolves an external image URI to its encoded bytes.
    fn resolve_image(&self, uri: &str) -> Result<Vec<u8>, ImportError>;
}

/// Resolves relative URIs against the directory of the document.
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    base_path: PathBuf,
}

impl FileSystemResolver {
    /// Creates a resolver rooted at `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Creates a resolver for the directory that contains `document`.
    pub fn for_document(document: &Path) -> Self {
        Self::new(document.parent().unwrap_or_else(|| Path::new(".")))
    }

    fn read(&self, uri: &str) -> Result<Vec<u8>, ImportError> {
        let path = self.base_path.join(percent_decode(uri));
        std::fs::read(&path).map_err(|source| ImportError::Resource {
            uri: uri.to_owned(),
            reason: format!("failed to read '{}': {source}", path.display()),
        })
    }
}

impl ResourceResolver for FileSystemResolver {
    fn resolve_buffer(&self, uri: &str) -> Result<Vec<u8>, ImportError> {
        self.read(uri)
    }

    fn resolve_image(&self, uri: &str) -> Result<Vec<u8>, ImportError> {
        self.read(uri)
    }
}

/// Decodes a `data:[<mime>];base64,<payload>` URI.
///
/// Returns the declared MIME type, if any, and the decoded payload.
pub fn decode_data_uri(uri: &str) -> Result<(Option<String>, Vec<u8>), ImportError> {
    let unsupported = || ImportError::Resource {
        uri: truncate_uri(uri),
        reason: "unsupported data URI".to_owned(),
    };
    let rest = uri.strip_prefix("data:").ok_or_else(unsupported)?;
    let (header, payload) = rest.split_once(',').ok_or_else(unsupported)?;
    let mime = header.strip_suffix(";base64").ok_or_else(unsupported)?;

    let data = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ImportError::Resource {
            uri: truncate_uri(uri),
            reason: e.to_string(),
        })?;
    let mime = (!mime.is_empty()).then(|| mime.to_owned());
    Ok((mime, data))
}

fn truncate_uri(uri: &str) -> String {
    uri.chars().take(48).collect()
}

/// Decodes `%XX` escapes, which glTF exporters emit for spaces and non-ASCII file names.
fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_uri_variants() {
        let (mime, data) = decode_data_uri("data:application/octet-stream;base64,AAEC").unwrap();
        assert_eq!(mime.as_deref(), Some("application/octet-stream"));
        assert_eq!(data, vec![0, 1, 2]);

        let (mime, data) = decode_data_uri("data:;base64,AQ==").unwrap();
        assert!(mime.is_none());
        assert_eq!(data, vec![1]);

        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("model.bin").is_err());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("my%20model.bin"), "my model.bin");
        assert_eq!(percent_decode("%E6%A4%85.png"), "椅.png");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("plain.bin"), "plain.bin");
    }
}
