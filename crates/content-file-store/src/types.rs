//! Media type to file extension mapping

/// Known media types and their canonical extensions
const EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/svg+xml", ".svg"),
    ("application/pdf", ".pdf"),
    ("text/plain", ".txt"),
    ("text/html", ".html"),
    ("application/json", ".json"),
    ("application/octet-stream", ".bin"),
];

/// Extensions accepted on read in addition to the canonical ones
const ALIASES: &[(&str, &str)] = &[(".jpeg", "image/jpeg"), (".htm", "text/html")];

/// Canonical extension (with leading dot) for a media type
///
/// Parameters such as `; charset=utf-8` are ignored.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(ct, _)| *ct == essence)
        .map(|(_, ext)| *ext)
}

/// Media type for an extension (with leading dot)
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(_, ext)| *ext == extension)
        .map(|(ct, _)| *ct)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(ext, _)| *ext == extension)
                .map(|(_, ct)| *ct)
        })
}
