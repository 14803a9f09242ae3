//! Pure functions over a block-content sequence. Nothing here touches the
//! persistence port.

use std::collections::HashSet;

use quill_types::models::ContentBlock;

pub const MAX_TAGS: usize = 5;
pub const MAX_TAG_LENGTH: usize = 25;

const IMAGE_BLOCK: &str = "image";

fn image_url(block: &ContentBlock) -> Option<&str> {
    if block.kind != IMAGE_BLOCK {
        return None;
    }
    block.data.get("file")?.get("url")?.as_str()
}

/// The cover image is the URL of the first `image` block. Later image
/// blocks are ignored.
pub fn find_cover_image(content: &[ContentBlock]) -> Option<String> {
    content
        .iter()
        .find_map(|block| image_url(block).map(str::to_string))
}

/// File identifiers (terminal path segment, extension stripped) of every
/// image referenced by the content. Upload pruning compares two of these
/// sets to decide which files on disk are no longer referenced.
pub fn extract_used_images(content: &[ContentBlock]) -> HashSet<String> {
    content
        .iter()
        .filter_map(image_url)
        .filter_map(|url| {
            let name = url.rsplit('/').next()?;
            let stem = name.split('.').next().unwrap_or(name);
            (!stem.is_empty()).then(|| stem.to_string())
        })
        .collect()
}

/// A tag survives publishing when it is non-empty after trimming and at
/// most 25 characters long.
pub fn is_valid_tag(tag: &str) -> bool {
    let trimmed = tag.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_TAG_LENGTH
}

/// Sanitize raw tag input from the editor form: trim, drop empties and
/// over-length tags, drop exact duplicates keeping the first occurrence.
pub fn validate_tags(raw_tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw_tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| is_valid_tag(tag))
        .filter(|tag| seen.insert(tag.to_string()))
        .map(str::to_string)
        .collect()
}

/// Publishability of the story body: a trimmed title and a bounded tag
/// count. Per-tag validity is checked separately with [`is_valid_tag`].
pub fn is_publishable(title: &str, tags: &[String]) -> bool {
    !title.trim().is_empty() && tags.len() <= MAX_TAGS
}
