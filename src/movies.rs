use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::config::ImdbConfig;
use crate::error::BotError;

/// Pre-encoded comma placed between keywords in the query string.
const KEYWORD_SEPARATOR: &str = "%2C";

/// Scrapes the keyword search page for matching titles.
pub struct MovieLookup {
    client: reqwest::Client,
    search_url: String,
    selector: Selector,
}

impl MovieLookup {
    pub fn new(config: &ImdbConfig) -> Result<Self, BotError> {
        let selector = Selector::parse(&config.title_selector).map_err(|e| BotError::Selector {
            selector: config.title_selector.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        let client = builder
            .build()
            .map_err(|e| BotError::network("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            selector,
        })
    }

    /// Fetch the listing for `keywords` and return the matching titles,
    /// one per line. An empty string means nothing matched.
    pub async fn lookup(&self, keywords: &[String]) -> Result<String, BotError> {
        let url = build_query_url(&self.search_url, keywords)?;

        debug!("Fetching movie listing: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::network(format!("Failed to fetch {url}"), e))?
            .error_for_status()
            .map_err(|e| BotError::network(format!("Listing request failed for {url}"), e))?;

        let html = response.text().await.map_err(|e| BotError::Parse {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let titles = extract_titles(&html, &self.selector);
        info!("Found {} titles for keywords {:?}", titles.len(), keywords);

        Ok(format_titles(&titles))
    }
}

/// `base` + first keyword, then `%2C` + each following keyword.
/// Keywords are appended as-is, without URL escaping.
pub fn build_query_url(base: &str, keywords: &[String]) -> Result<String, BotError> {
    let (first, rest) = keywords.split_first().ok_or(BotError::NoKeywords)?;

    let mut url = String::from(base);
    url.push_str(first);
    for keyword in rest {
        url.push_str(KEYWORD_SEPARATOR);
        url.push_str(keyword);
    }
    Ok(url)
}

/// One title per element matching `selector`, in document order.
///
/// The title is the text of all child elements joined together and trimmed,
/// so a listing header yields e.g. `1.Heat(1995)`. Text sitting directly in
/// the match between children is skipped. A match without child elements
/// contributes its own trimmed text.
pub fn extract_titles(html: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(selector)
        .map(|heading| {
            let mut children = heading.child_elements().peekable();
            let text: String = if children.peek().is_none() {
                heading.text().collect()
            } else {
                children.flat_map(|child| child.text()).collect()
            };
            text.trim().to_string()
        })
        .collect()
}

pub fn format_titles(titles: &[String]) -> String {
    let mut out = String::new();
    for title in titles {
        out.push_str(title);
        out.push('\n');
    }
    out
}
