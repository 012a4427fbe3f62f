use serde::{Deserialize, Deserializer, Serialize};

/// Accepts a string, a number or null. The API is inconsistent about scores,
/// episode counts and similar fields.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeCard {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "batchId")]
    pub anime_id: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub score: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub episodes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub release_day: Option<String>,
    #[serde(default, alias = "lastReleaseDate", deserialize_with = "lenient_string")]
    pub latest_release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub estimation: Option<String>,
}

impl AnimeCard {
    pub fn score_label(&self) -> &str {
        self.score.as_deref().unwrap_or("N/A")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDay {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub anime_list: Vec<AnimeCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterGroup {
    #[serde(default)]
    pub start_with: String,
    #[serde(default)]
    pub anime_list: Vec<AnimeCard>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeFeed {
    pub recent: Vec<AnimeCard>,
    pub batch: Vec<AnimeCard>,
    pub movies: Vec<AnimeCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Score {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub users: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Synopsis {
    #[serde(default)]
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeLink {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default)]
    pub episode_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeDetail {
    #[serde(default)]
    pub english: String,
    #[serde(default)]
    pub japanese: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub score: Score,
    #[serde(default)]
    pub synopsis: Synopsis,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub episodes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub studios: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub producers: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub aired: Option<String>,
    #[serde(default)]
    pub genre_list: Vec<Genre>,
    #[serde(default)]
    pub episode_list: Vec<EpisodeLink>,
}

impl AnimeDetail {
    pub fn display_title(&self) -> &str {
        if self.english.trim().is_empty() {
            &self.japanese
        } else {
            &self.english
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DownloadUrl {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Quality {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: Option<String>,
    #[serde(default)]
    pub urls: Vec<DownloadUrl>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DownloadSection {
    #[serde(default)]
    pub qualities: Vec<Quality>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub default_streaming_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub download_count: Option<String>,
    #[serde(default)]
    pub has_prev_episode: bool,
    #[serde(default)]
    pub prev_episode: Option<EpisodeLink>,
    #[serde(default)]
    pub has_next_episode: bool,
    #[serde(default)]
    pub next_episode: Option<EpisodeLink>,
    #[serde(default)]
    pub download_url: Option<DownloadSection>,
}

impl EpisodeDetail {
    pub fn prev_id(&self) -> Option<&str> {
        self.prev_episode
            .as_ref()
            .filter(|_| self.has_prev_episode)
            .map(|e| e.episode_id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn next_id(&self) -> Option<&str> {
        self.next_episode
            .as_ref()
            .filter(|_| self.has_next_episode)
            .map(|e| e.episode_id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn card_accepts_numeric_score_and_batch_id() {
        let card: AnimeCard = serde_json::from_value(json!({
            "title": "Frieren",
            "batchId": "frieren-batch",
            "type": "TV",
            "score": 9.1,
            "episodes": 28
        }))
        .unwrap();
        assert_eq!(card.anime_id, "frieren-batch");
        assert_eq!(card.kind.as_deref(), Some("TV"));
        assert_eq!(card.score_label(), "9.1");
        assert_eq!(card.episodes.as_deref(), Some("28"));
    }

    #[test]
    fn blank_score_shows_placeholder() {
        let card: AnimeCard = serde_json::from_value(json!({ "title": "x", "score": "" })).unwrap();
        assert_eq!(card.score_label(), "N/A");
    }

    #[test]
    fn episode_neighbours_require_flags() {
        let ep: EpisodeDetail = serde_json::from_value(json!({
            "title": "Ep 2",
            "hasPrevEpisode": true,
            "prevEpisode": { "episodeId": "ep-1" },
            "hasNextEpisode": false,
            "nextEpisode": { "episodeId": "ep-3" }
        }))
        .unwrap();
        assert_eq!(ep.prev_id(), Some("ep-1"));
        assert_eq!(ep.next_id(), None);
    }

    #[test]
    fn detail_title_falls_back_to_japanese() {
        let detail: AnimeDetail =
            serde_json::from_value(json!({ "english": "", "japanese": "葬送のフリーレン" })).unwrap();
        assert_eq!(detail.display_title(), "葬送のフリーレン");
    }
}
