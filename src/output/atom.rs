use crate::feed::FeedData;
use crate::output::{OutputError, OutputResult};
use atom_syndication::{Content, Entry, Feed, FixedDateTime, Generator, Link};
use chrono::{DateTime, Utc};

/// Serializes `feed` as an Atom 1.0 document
pub fn to_atom(feed: &FeedData, updated: DateTime<Utc>) -> OutputResult<String> {
    let mut document = Feed::default();
    document.set_title(feed.title.as_str());
    document.set_id(feed.url.as_str());
    document.set_updated(FixedDateTime::from(updated));
    document.set_icon(feed.favicon.clone());
    document.set_links(vec![alternate_link(&feed.url)]);

    let mut generator = Generator::default();
    generator.set_value(env!("CARGO_PKG_NAME"));
    generator.set_version(Some(env!("CARGO_PKG_VERSION").to_string()));
    document.set_generator(generator);

    let entries: Vec<Entry> = feed
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let retrieved = FixedDateTime::from(entry.retrieved);

            let mut content = Content::default();
            content.set_content_type(Some("html".to_string()));
            content.set_value(Some(entry.contents.clone()));

            let mut item = Entry::default();
            item.set_id(entry.id.as_str());
            item.set_title(entry.title.clone().unwrap_or_else(|| index.to_string()));
            item.set_links(vec![alternate_link(entry.link.as_deref().unwrap_or(&feed.url))]);
            item.set_updated(retrieved);
            item.set_published(Some(retrieved));
            item.set_content(Some(content));
            item
        })
        .collect();
    document.set_entries(entries);

    let bytes = document
        .write_to(Vec::new())
        .map_err(|e| OutputError::Format(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Format(e.to_string()))
}

fn alternate_link(href: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}
