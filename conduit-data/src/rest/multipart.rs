//! `multipart/form-data` bodies with a timestamp-derived boundary.

use std::time::{SystemTime, UNIX_EPOCH};

use super::params::Params;

const CRLF: &str = "\r\n";

/// Text and binary fields of a multipart body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MultipartFields {
    pub(crate) text: Params,
    pub(crate) bytes: Vec<(String, Vec<u8>)>,
}

impl MultipartFields {
    /// Set a text field, replacing earlier values for `name`.
    pub(crate) fn set_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.text.set(name, value);
    }

    /// Set a binary field, replacing earlier values for `name`.
    pub(crate) fn set_bytes(&mut self, name: impl Into<String>, value: Vec<u8>) {
        let name = name.into();
        self.bytes.retain(|(existing, _)| *existing != name);
        self.bytes.push((name, value));
    }

    /// Render every part followed by the closing delimiter.
    pub(crate) fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in self.text.iter() {
            body.extend_from_slice(
                format!(
                    "--{boundary}{CRLF}\
                     Content-Disposition: form-data; name=\"{name}\"{CRLF}\
                     Content-Type: text/plain; charset=UTF-8{CRLF}\
                     {CRLF}\
                     {value}{CRLF}"
                )
                .as_bytes(),
            );
        }
        for (name, value) in &self.bytes {
            body.extend_from_slice(
                format!(
                    "--{boundary}{CRLF}\
                     Content-Disposition: form-data; name=\"{name}\"; filename=\"raw\"{CRLF}\
                     Content-Type: application/octet-stream{CRLF}\
                     Content-Transfer-Encoding: binary{CRLF}\
                     {CRLF}"
                )
                .as_bytes(),
            );
            body.extend_from_slice(value);
            body.extend_from_slice(CRLF.as_bytes());
        }
        body.extend_from_slice(format!("{CRLF}--{boundary}--{CRLF}").as_bytes());
        body
    }
}

/// Boundary for a body created now: `---` followed by Unix milliseconds.
pub(crate) fn boundary() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis());
    format!("---{millis}")
}
