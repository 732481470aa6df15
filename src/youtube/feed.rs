use crate::errors::YouTubeError;
use crate::models::Video;

const VIDEO_ID_PREFIX: &str = "yt:video:";

/// YouTubeのAtomフィードを解析し、動画を新しい順に返す
pub fn parse_feed(body: &[u8], channel_id: &str) -> Result<Vec<Video>, YouTubeError> {
    let feed = feed_rs::parser::parse(body)?;

    let videos = feed
        .entries
        .into_iter()
        .map(|entry| {
            let video_id = entry
                .id
                .strip_prefix(VIDEO_ID_PREFIX)
                .unwrap_or(&entry.id)
                .to_string();
            let url = entry
                .links
                .first()
                .map(|link| link.href.clone())
                .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", video_id));

            Video {
                video_id,
                channel_id: channel_id.to_string(),
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                url,
                author: entry.authors.first().map(|person| person.name.clone()),
                published: entry.published,
                id: entry.id,
            }
        })
        .collect();

    Ok(videos)
}

#[cfg(test)]
pub(crate) const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id=UCXuqSBlHAE6Xw-yeJA0Tunw"/>
 <id>yt:channel:XuqSBlHAE6Xw-yeJA0Tunw</id>
 <yt:channelId>XuqSBlHAE6Xw-yeJA0Tunw</yt:channelId>
 <title>Linus Tech Tips</title>
 <author>
  <name>Linus Tech Tips</name>
  <uri>https://www.youtube.com/channel/UCXuqSBlHAE6Xw-yeJA0Tunw</uri>
 </author>
 <published>2008-11-25T00:46:52+00:00</published>
 <entry>
  <id>yt:video:newest00001</id>
  <yt:videoId>newest00001</yt:videoId>
  <yt:channelId>UCXuqSBlHAE6Xw-yeJA0Tunw</yt:channelId>
  <title>The Newest Upload</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=newest00001"/>
  <author>
   <name>Linus Tech Tips</name>
   <uri>https://www.youtube.com/channel/UCXuqSBlHAE6Xw-yeJA0Tunw</uri>
  </author>
  <published>2024-05-02T17:00:00+00:00</published>
  <updated>2024-05-02T18:00:00+00:00</updated>
 </entry>
 <entry>
  <id>yt:video:older000002</id>
  <yt:videoId>older000002</yt:videoId>
  <yt:channelId>UCXuqSBlHAE6Xw-yeJA0Tunw</yt:channelId>
  <title>An Older Upload</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v=older000002"/>
  <author>
   <name>Linus Tech Tips</name>
   <uri>https://www.youtube.com/channel/UCXuqSBlHAE6Xw-yeJA0Tunw</uri>
  </author>
  <published>2024-05-01T17:00:00+00:00</published>
  <updated>2024-05-01T18:00:00+00:00</updated>
 </entry>
</feed>"#;
