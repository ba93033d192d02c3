use super::fixtures;
use crate::oddspark::{
    closed_at, collect_oneday_links, extract_races, filter_links_by_day, venue_name, OneDayCard,
    Race, BASE_URL,
};
use pretty_assertions::assert_eq;

#[test]
fn test_collect_oneday_links() {
    let html = fixtures::load_html_fixture("kaisai_race_list");
    let links = collect_oneday_links(&html, BASE_URL).unwrap();

    // The absolute and relative 伊勢崎 links collapse into one, the link without
    // raceDy is skipped and RaceList links are not OneDay links
    let keys: Vec<(&str, &str)> = links
        .iter()
        .map(|link| (link.race_day.as_str(), link.place_cd.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![("20240101", "03"), ("20240101", "05"), ("20240102", "02")]
    );
    assert_eq!(
        links[0].url,
        "https://www.oddspark.com/autorace/OneDayRaceList.do?raceDy=20240101&placeCd=03"
    );
}

#[test]
fn test_filter_links_by_day() {
    let html = fixtures::load_html_fixture("kaisai_race_list");
    let links = collect_oneday_links(&html, BASE_URL).unwrap();

    let today = filter_links_by_day(links.clone(), "20240101");
    let places: Vec<&str> = today.iter().map(|link| link.place_cd.as_str()).collect();
    assert_eq!(places, vec!["03", "05"]);

    assert!(filter_links_by_day(links, "20231231").is_empty());
}

#[test]
fn test_extract_races_from_one_day_page() {
    let html = fixtures::load_html_fixture("one_day_race_list");
    let card = extract_races(&html, "03");

    assert_eq!(card.venue, "伊勢崎");
    assert_eq!(card.grade, "");

    // 3R has only five riders and 4R's table is not a start list
    let numbers: Vec<u32> = card.races.iter().map(|race| race.number).collect();
    assert_eq!(numbers, vec![1, 2]);

    let first = &card.races[0];
    assert_eq!(first.start_time, "09:05");
    assert_eq!(first.closed_at, "09:03");
    assert_eq!(first.class_category, "一般");
    assert_eq!(
        first.players,
        vec!["1小林一", "2加藤二", "3吉田三", "4佐藤貴也", "5山本五", "6松本六"]
    );

    let second = &card.races[1];
    assert_eq!(second.start_time, "15:32");
    assert_eq!(second.closed_at, "15:30");
    assert_eq!(second.class_category, "予選");
    assert_eq!(second.players.len(), 8);
    assert_eq!(second.players[0], "1山田太郎");
    assert_eq!(second.players[7], "8中村八郎");
}

#[test]
fn test_extract_races_unknown_venue() {
    let html = fixtures::load_html_fixture("one_day_race_list");
    let card = extract_races(&html, "01");
    assert_eq!(card.venue, "");
    assert_eq!(card.races.len(), 2);
}

#[test]
fn test_extract_races_empty_page() {
    let card = extract_races("<html><body><p>開催なし</p></body></html>", "02");
    assert_eq!(card.venue, "川口");
    assert!(card.races.is_empty());
}

/// One race header and a six-rider start list
fn single_race_page(header: &str) -> String {
    let riders: String = (1..=6)
        .map(|car| {
            format!(
                r#"<tr><td class="bg-{car}">{car}</td><td class="racer1">選手 {car}</td></tr>"#,
                car = car
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="h30">{}</div><table><tr><th>車番</th><th>選手名</th></tr>{}</table></body></html>"#,
        header, riders
    )
}

#[test]
fn test_start_time_after_its_label_in_a_nested_tag() {
    // The whole header reads "5R 一般 18:48 発走", so only the nested span
    // text, which repeats the time after the label, yields a start time
    let html = single_race_page(
        r#"<strong><a href="/autorace/RaceList.do?raceNo=5">5R 一般</a></strong><span><b>18:48</b> 発走</span>"#,
    );
    let card = extract_races(&html, "06");

    assert_eq!(card.races.len(), 1);
    assert_eq!(card.races[0].start_time, "18:48");
    assert_eq!(card.races[0].closed_at, "18:46");
}

#[test]
fn test_full_width_start_time() {
    let html = single_race_page(
        r#"<strong><a href="/autorace/RaceList.do?raceNo=7">7R 選抜</a></strong><span class="start-time">発走時間 <strong>１９:０５</strong></span>"#,
    );
    let card = extract_races(&html, "02");

    assert_eq!(card.races[0].start_time, "19:05");
    assert_eq!(card.races[0].closed_at, "19:03");
    assert_eq!(card.races[0].players[5], "6選手6");
}

#[test]
fn test_venue_names() {
    assert_eq!(venue_name("02"), Some("川口"));
    assert_eq!(venue_name("06"), Some("山陽"));
    assert_eq!(venue_name("01"), None);
}

#[test]
fn test_closed_at_same_day() {
    assert_eq!(closed_at("15:00"), "14:58");
    assert_eq!(closed_at("09:05"), "09:03");
    assert_eq!(closed_at("9:05"), "09:03");
    assert_eq!(closed_at("20:01"), "19:59");
}

#[test]
fn test_closed_at_crosses_midnight_backwards() {
    assert_eq!(closed_at("00:01"), "23:59");
}

#[test]
fn test_closed_at_after_midnight_notation() {
    assert_eq!(closed_at("24:30"), "24:28");
    assert_eq!(closed_at("25:00"), "24:58");
    // Stepping back into the previous day drops the 24h+ notation
    assert_eq!(closed_at("24:01"), "23:59");
}

#[test]
fn test_closed_at_full_width_digits() {
    assert_eq!(closed_at("１５:００"), "14:58");
}

#[test]
fn test_closed_at_passes_through_unparseable() {
    assert_eq!(closed_at("未定"), "未定");
    assert_eq!(closed_at("12:75"), "12:75");
    assert_eq!(closed_at("123:00"), "123:00");
}

#[test]
fn test_card_into_rows() {
    let card = OneDayCard {
        venue: "飯塚".to_string(),
        grade: String::new(),
        races: vec![Race {
            number: 7,
            start_time: "18:48".to_string(),
            closed_at: "18:46".to_string(),
            players: vec!["1甲".to_string(), "2乙".to_string()],
            class_category: "準決".to_string(),
        }],
    };

    let rows = card.into_rows("20240101");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "20240101");
    assert_eq!(rows[0].venue, "飯塚");
    assert_eq!(rows[0].race_number, 7);
    assert_eq!(rows[0].players, "1甲,2乙");
}
