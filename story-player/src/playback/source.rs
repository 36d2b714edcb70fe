//! Media source resolution
//!
//! Turns the CMS-supplied media list into the ordered, immutable list of
//! playable story items. Absence of input is a normal case: the built-in
//! default list is substituted.

use story_common::config::MediaRef;

/// Built-in story list used when no (usable) media references are supplied
pub const DEFAULT_STORY_SOURCES: &[&str] = &[
    "/videos/stories/story-1.mp4",
    "/videos/stories/story-2.mp4",
    "/videos/stories/story-3.mp4",
    "/videos/stories/story-4.mp4",
];

/// One playable story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryItem {
    pub source_url: String,
    pub title: Option<String>,
}

impl StoryItem {
    fn from_ref(media: &MediaRef) -> Self {
        Self {
            source_url: media.source_url.trim().to_string(),
            title: media.title.clone(),
        }
    }
}

/// Resolve the ordered story list
///
/// Entries with a blank URL are skipped. If nothing usable remains the
/// default list is returned, so the result is never empty.
pub fn resolve_items(media: Option<&[MediaRef]>) -> Vec<StoryItem> {
    let items: Vec<StoryItem> = media
        .unwrap_or_default()
        .iter()
        .filter(|m| !m.source_url.trim().is_empty())
        .map(StoryItem::from_ref)
        .collect();

    if !items.is_empty() {
        return items;
    }

    tracing::debug!("No usable media references, using built-in story list");
    DEFAULT_STORY_SOURCES
        .iter()
        .map(|url| StoryItem {
            source_url: (*url).to_string(),
            title: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_list_uses_defaults() {
        let items = resolve_items(None);
        assert_eq!(items.len(), DEFAULT_STORY_SOURCES.len());
        assert_eq!(items[0].source_url, DEFAULT_STORY_SOURCES[0]);
    }

    #[test]
    fn test_empty_list_uses_defaults() {
        let items = resolve_items(Some(&[]));
        assert!(!items.is_empty());
    }

    #[test]
    fn test_blank_urls_are_skipped() {
        let media = vec![
            MediaRef::new("  "),
            MediaRef {
                source_url: "https://cdn.example.com/a.mp4 ".to_string(),
                title: Some("A".to_string()),
            },
            MediaRef::new(""),
        ];

        let items = resolve_items(Some(&media));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_url, "https://cdn.example.com/a.mp4");
        assert_eq!(items[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn test_all_blank_falls_back() {
        let media = vec![MediaRef::new(""), MediaRef::new(" ")];
        assert_eq!(resolve_items(Some(&media)).len(), DEFAULT_STORY_SOURCES.len());
    }

    #[test]
    fn test_order_is_preserved() {
        let media: Vec<MediaRef> = (0..5)
            .map(|i| MediaRef::new(format!("https://cdn.example.com/{i}.mp4")))
            .collect();

        let items = resolve_items(Some(&media));
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.source_url, format!("https://cdn.example.com/{i}.mp4"));
        }
    }
}
