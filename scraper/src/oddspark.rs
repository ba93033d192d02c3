use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CACHE_CONTROL, REFERER, USER_AGENT,
};
use reqwest::{StatusCode, Url};
use scraper::{ElementRef, Html, Selector};

use crate::row::RaceRow;

pub const BASE_URL: &str = "https://www.oddspark.com";
pub const KAISAI_PATH: &str = "/autorace/KaisaiRaceList.do";

const USER_AGENT_VALUE: &str =
    "Mozilla/5.0 (compatible; MofuTimer-Auto/1.0; +https://example.invalid)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(800);

const CLOSE_BEFORE_START_MINUTES: i64 = 2;
const MINUTES_PER_DAY: i64 = 24 * 60;

pub const MIN_PLAYERS: usize = 6;
pub const MAX_PLAYERS: usize = 8;

/// Venue name for an OddsPark `placeCd` (01 is unused).
pub fn venue_name(place_cd: &str) -> Option<&'static str> {
    match place_cd {
        "02" => Some("川口"),
        "03" => Some("伊勢崎"),
        "04" => Some("浜松"),
        "05" => Some("飯塚"),
        "06" => Some("山陽"),
        _ => None,
    }
}

/// A link to one venue's start list for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneDayLink {
    pub url: String,
    pub race_day: String,
    pub place_cd: String,
}

impl OneDayLink {
    fn from_url(url: &Url) -> Option<OneDayLink> {
        let mut race_day = None;
        let mut place_cd = None;
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "raceDy" if race_day.is_none() => race_day = Some(value.into_owned()),
                "placeCd" if place_cd.is_none() => place_cd = Some(value.into_owned()),
                _ => {}
            }
        }

        Some(OneDayLink {
            url: url.to_string(),
            race_day: race_day?,
            place_cd: place_cd?,
        })
    }

    fn key(&self) -> (String, String) {
        (self.race_day.clone(), self.place_cd.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Race {
    pub number: u32,
    pub start_time: String,
    pub closed_at: String,
    pub players: Vec<String>,
    pub class_category: String,
}

/// Races extracted from a single OneDay page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneDayCard {
    pub venue: String,
    pub grade: String,
    pub races: Vec<Race>,
}

impl OneDayCard {
    pub fn into_rows(self, day: &str) -> Vec<RaceRow> {
        let OneDayCard {
            venue,
            grade,
            races,
        } = self;
        races
            .into_iter()
            .map(|race| RaceRow {
                date: day.to_string(),
                venue: venue.clone(),
                grade: grade.clone(),
                race_number: race.number,
                start_time: race.start_time,
                closed_at: race.closed_at,
                players: race.players.join(","),
                class_category: race.class_category,
            })
            .collect()
    }
}

pub fn build_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ja,en;q=0.8"));
    headers.insert(
        REFERER,
        HeaderValue::from_static("https://www.oddspark.com/autorace/"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// GET a page, retrying with a linear backoff until a non-empty 200 comes back.
///
/// When every attempt misses, a transport error from any attempt or an error
/// status on the last one fails the fetch. An empty 200 is returned as it is.
pub fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let mut transport_error = None;
    let mut last_response = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let received = client.get(url).send().and_then(|response| {
            let status = response.status();
            response.text().map(|text| (status, text))
        });

        match received {
            Ok((status, text)) if status == StatusCode::OK && !text.is_empty() => return Ok(text),
            Ok((status, text)) => {
                warn!(
                    "GET {} -> status={}, len={} (try {}/{})",
                    url,
                    status,
                    text.len(),
                    attempt,
                    MAX_ATTEMPTS
                );
                last_response = Some((status, text));
            }
            Err(e) => {
                warn!("GET {} failed: {} (try {}/{})", url, e, attempt, MAX_ATTEMPTS);
                transport_error = Some(e);
            }
        }

        if attempt < MAX_ATTEMPTS {
            thread::sleep(BACKOFF_STEP * attempt);
        }
    }

    if let Some(e) = transport_error {
        return Err(anyhow::Error::new(e).context(format!("GET {} failed", url)));
    }
    match last_response {
        Some((status, _)) if status.is_client_error() || status.is_server_error() => {
            Err(anyhow!("GET {} returned status {}", url, status))
        }
        Some((_, text)) => Ok(text),
        None => Err(anyhow!("GET {} failed", url)),
    }
}

/// Collect every OneDay start-list link on a KaisaiRaceList page, resolving
/// relative links against `base_url`.
pub fn collect_oneday_links(html: &str, base_url: &str) -> Result<Vec<OneDayLink>> {
    let base = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse(r#"a[href*="/autorace/OneDayRaceList.do"]"#).unwrap();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(url) = base.join(href) else {
            continue;
        };
        if let Some(link) = OneDayLink::from_url(&url) {
            if seen.insert(link.key()) {
                links.push(link);
            }
        }
    }

    Ok(links)
}

/// Keep only the links for `race_day`, one per venue.
pub fn filter_links_by_day(links: Vec<OneDayLink>, race_day: &str) -> Vec<OneDayLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| link.race_day == race_day && !link.place_cd.is_empty())
        .filter(|link| seen.insert(link.key()))
        .collect()
}

/// Voting closes two minutes before the start.
///
/// Start times at or past 24:00 belong to the next day and keep that notation
/// while the closing time is still on the next day, so `25:00` closes at
/// `24:58` but `24:01` closes at `23:59`. Input that is not `H:MM`/`HH:MM` is
/// returned unchanged.
pub fn closed_at(start_time: &str) -> String {
    let re = Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap();
    let digits = ascii_digits(start_time);
    let Some(caps) = re.captures(&digits) else {
        return start_time.to_string();
    };
    let (Ok(hour), Ok(minute)) = (caps[1].parse::<i64>(), caps[2].parse::<i64>()) else {
        return start_time.to_string();
    };
    if minute >= 60 {
        return start_time.to_string();
    }

    let closed = hour * 60 + minute - CLOSE_BEFORE_START_MINUTES;
    let day = closed.div_euclid(MINUTES_PER_DAY);
    let minute_of_day = closed.rem_euclid(MINUTES_PER_DAY);

    let display_hour = if hour >= 24 && day == 1 {
        minute_of_day / 60 + 24
    } else {
        minute_of_day / 60
    };
    format!("{:02}:{:02}", display_hour, minute_of_day % 60)
}

/// Full-width digits (`０`-`９`) as ASCII
fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect()
}

fn normalize_hhmm(text: &str) -> Option<String> {
    let text = ascii_digits(text);
    let (hour, minute) = text.trim().split_once(':')?;
    let hour = hour.trim().parse::<u32>().ok()?;
    let minute = minute.trim().parse::<u32>().ok()?;
    Some(format!("{:02}:{:02}", hour, minute))
}

/// Text of the first `limit` elements under `element`, each taken whole.
fn leading_tags_text(element: &ElementRef, limit: usize) -> String {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .take(limit)
        .map(|tag| joined_text(&tag, " "))
        .collect::<Vec<_>>()
        .join(" ")
}

fn joined_text(element: &ElementRef, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

struct RacePatterns {
    race_number: Regex,
    start_time: Regex,
    start_list_columns: Regex,
    class_category: Regex,
    car_class: Regex,
    title_link: Selector,
    start_time_cell: Selector,
    row: Selector,
    cell: Selector,
    racer_cell: Selector,
}

impl RacePatterns {
    fn new() -> RacePatterns {
        RacePatterns {
            race_number: Regex::new(r"(\d+)\s*R\b").unwrap(),
            start_time: Regex::new(r"(発走(?:時間|予定)?)[^\d]*(\d{1,2}:\d{2})").unwrap(),
            start_list_columns: Regex::new(r"(車\s*番|選手名|LG|ハンデ|現ランク|審査|試走)")
                .unwrap(),
            class_category: Regex::new(r"(一般|予選|準決勝?|優勝戦|特別|選抜)").unwrap(),
            car_class: Regex::new(r"\bbg-[1-8]\b").unwrap(),
            title_link: Selector::parse(r#"strong > a[href*="/autorace/RaceList.do"]"#).unwrap(),
            start_time_cell: Selector::parse("span.start-time strong").unwrap(),
            row: Selector::parse("tr").unwrap(),
            cell: Selector::parse("td").unwrap(),
            racer_cell: Selector::parse("td.racer1").unwrap(),
        }
    }

    /// `HH:MM` following a 発走 label, e.g. "発走予定 9:05"
    fn labelled_start_time(&self, text: &str) -> Option<String> {
        self.start_time
            .captures(text)
            .and_then(|caps| normalize_hhmm(&caps[2]))
    }
}

/// Extract the races of one venue's OneDay page.
///
/// Each race header is a `div.h30`; its start list is the first `table` that
/// follows it in document order.
pub fn extract_races(html: &str, place_cd: &str) -> OneDayCard {
    let document = Html::parse_document(html);
    let header_selector = Selector::parse("div.h30").unwrap();
    let table_selector = Selector::parse("table").unwrap();
    let patterns = RacePatterns::new();

    let mut pending_headers: Vec<ElementRef> = Vec::new();
    let mut races = Vec::new();

    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if header_selector.matches(&element) {
            pending_headers.push(element);
        } else if table_selector.matches(&element) {
            for header in pending_headers.drain(..) {
                if let Some(race) = parse_race(&header, &element, &patterns) {
                    races.push(race);
                }
            }
        }
    }

    races.sort_by_key(|race| race.number);

    OneDayCard {
        venue: venue_name(place_cd).unwrap_or_default().to_string(),
        grade: String::new(),
        races,
    }
}

fn parse_race(header: &ElementRef, table: &ElementRef, patterns: &RacePatterns) -> Option<Race> {
    let link = header.select(&patterns.title_link).next()?;

    // e.g. "9R  予選  3100m(6周)"
    let title = joined_text(&link, " ").replace('\u{3000}', " ");
    let number = patterns.race_number.captures(&title)?[1].parse::<u32>().ok()?;

    let start_time = match header.select(&patterns.start_time_cell).next() {
        Some(cell) => normalize_hhmm(&cell.text().collect::<String>()),
        None => patterns
            .labelled_start_time(&joined_text(header, " "))
            .or_else(|| patterns.labelled_start_time(&leading_tags_text(header, 5))),
    };

    if !patterns.start_list_columns.is_match(&joined_text(table, " ")) {
        return None;
    }

    let class_category = patterns
        .class_category
        .captures(&title)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let players = extract_players(table, patterns);

    let start_time = start_time?;
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
        return None;
    }

    Some(Race {
        number,
        closed_at: closed_at(&start_time),
        start_time,
        players,
        class_category,
    })
}

fn extract_players(table: &ElementRef, patterns: &RacePatterns) -> Vec<String> {
    let mut players = Vec::new();

    for row in table.select(&patterns.row) {
        let cells: Vec<ElementRef> = row.select(&patterns.cell).collect();
        if cells.is_empty() {
            continue;
        }

        let car_cell = cells.iter().find(|cell| {
            cell.value()
                .attr("class")
                .map(|classes| {
                    classes
                        .split_whitespace()
                        .any(|class| patterns.car_class.is_match(class))
                })
                .unwrap_or(false)
        });
        let Some(car_cell) = car_cell else {
            continue;
        };
        let car = car_cell.text().collect::<String>().trim().to_string();
        if !matches!(car.as_str(), "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8") {
            continue;
        }

        // td.racer1 skips the two prediction-mark columns
        let name_cell = row.select(&patterns.racer_cell).next().or_else(|| {
            cells
                .iter()
                .skip(1)
                .find(|cell| !cell.text().collect::<String>().trim().is_empty())
                .copied()
        });
        let Some(name_cell) = name_cell else {
            continue;
        };

        let name: String = name_cell
            .text()
            .collect::<String>()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        players.push(format!("{}{}", car, name));
    }

    players
}

/// Scrape every venue racing on `race_day` into CSV rows.
pub fn scrape_day(client: &Client, race_day: &str) -> Result<Vec<RaceRow>> {
    scrape_day_from(client, BASE_URL, race_day)
}

/// `scrape_day` against the site at `base_url`.
///
/// The plain KaisaiRaceList page is tried first. Only when it has no OneDay
/// link for `race_day` is the page fetched again with `raceDy` set.
pub fn scrape_day_from(client: &Client, base_url: &str, race_day: &str) -> Result<Vec<RaceRow>> {
    let kaisai_url = format!("{}{}", base_url.trim_end_matches('/'), KAISAI_PATH);

    info!("GET (no param): {}", kaisai_url);
    let html = fetch_html(client, &kaisai_url)?;
    let links = collect_oneday_links(&html, base_url)?;
    info!("found links (no param) = {}", links.len());
    let mut links = filter_links_by_day(links, race_day);
    info!("filtered (no param) to raceDy={}: {}", race_day, links.len());

    if links.is_empty() {
        let url_with_day = format!("{}?raceDy={}", kaisai_url, race_day);
        info!("GET (with raceDy): {}", url_with_day);
        let html = fetch_html(client, &url_with_day)?;
        let found = collect_oneday_links(&html, base_url)?;
        info!("found links (with raceDy) = {}", found.len());
        links = filter_links_by_day(found, race_day);
        info!("filtered (with raceDy) to raceDy={}: {}", race_day, links.len());
    }

    if links.is_empty() {
        warn!("OneDay links not found for {}", race_day);
    }

    info!("crawl OneDay pages: {} targets", links.len());
    let mut rows = Vec::new();
    for link in &links {
        info!("OneDay: {}", link.url);
        let html = fetch_html(client, &link.url)
            .with_context(|| format!("Failed to fetch OneDay page {}", link.url))?;
        let card = extract_races(&html, &link.place_cd);
        info!("venue={:?} rows={}", card.venue, card.races.len());
        rows.extend(card.into_rows(&link.race_day));
    }

    Ok(rows)
}

pub fn write_csv<P: AsRef<Path>>(path: P, rows: &[RaceRow]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write CSV row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {}", path.display()))
}
