use crate::feed::FeedData;
use crate::output::{OutputError, OutputResult};
use chrono::{DateTime, Utc};
use rss::{Channel, Enclosure, Guid, Image, Item};

/// Serializes `feed` as an RSS 2.0 document
///
/// Entry images become enclosures, which Atom has no equivalent for.
pub fn to_rss(feed: &FeedData, updated: DateTime<Utc>) -> OutputResult<String> {
    let items: Vec<Item> = feed
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut guid = Guid::default();
            guid.set_value(entry.id.as_str());
            guid.set_permalink(false);

            let mut item = Item::default();
            item.set_title(entry.title.clone().unwrap_or_else(|| index.to_string()));
            item.set_link(entry.link.clone().unwrap_or_else(|| feed.url.clone()));
            item.set_description(entry.contents.clone());
            item.set_guid(guid);
            item.set_pub_date(entry.retrieved.to_rfc2822());
            item.set_enclosure(entry.image.as_deref().map(enclosure));
            item
        })
        .collect();

    let mut channel = Channel::default();
    channel.set_title(feed.title.as_str());
    channel.set_link(feed.url.as_str());
    channel.set_description(feed.title.as_str());
    channel.set_last_build_date(updated.to_rfc2822());
    channel.set_generator(format!(
        "{} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    channel.set_image(feed.favicon.as_deref().map(|favicon| {
        let mut image = Image::default();
        image.set_url(favicon);
        image.set_title(feed.title.as_str());
        image.set_link(feed.url.as_str());
        image
    }));
    channel.set_items(items);

    let bytes = channel
        .write_to(Vec::new())
        .map_err(|e| OutputError::Format(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| OutputError::Format(e.to_string()))
}

fn enclosure(url: &str) -> Enclosure {
    let mut enclosure = Enclosure::default();
    enclosure.set_url(url);
    enclosure.set_length("0");
    enclosure.set_mime_type(image_mime_type(url));
    enclosure
}

/// Guesses an image MIME type from the URL's extension
fn image_mime_type(url: &str) -> &'static str {
    let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or_default().to_ascii_lowercase();
    match path.rsplit_once('.').map(|(_, extension)| extension) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "image/jpeg",
    }
}
