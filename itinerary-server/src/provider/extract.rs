//! Field extraction from timetable pages.
//!
//! Every function here takes the page markup and returns raw string records.
//! Nothing is validated beyond the presence of the structural markers the
//! extraction depends on; missing markers mean the page layout changed.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::disambiguation::{DisambiguationForm, SelectOption, StationChoice};
use super::error::ProviderError;
use super::types::{RawConnectionDetail, RawConnectionList, RawConnectionRow, RawEndpoint, RawLeg};

/// Text the source shows instead of results when a station name matches
/// several stations.
pub const AMBIGUOUS_MARKER: &str = "Ihre Eingabe ist nicht eindeutig";

/// Control fields that must not be echoed back when resubmitting the form.
const SKIPPED_FORM_FIELDS: [&str; 4] = [
    "chgBC=y&getstop",
    "advancedProductMode",
    "resetLocation=Z&dummy",
    "REQ0HafasSearchForw",
];

/// Texts marking a connection as cancelled.
const CANCELLED_MARKERS: [&str; 2] = ["Ausfall", "fällt aus"];

/// Texts reporting a connection as running on time.
const ON_TIME_MARKERS: [&str; 2] = ["pünktlich", "+0"];

/// Class of the span the source uses for on-time notices.
const ON_TIME_CLASS: &str = "okmsg";

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d\d:\d\d").unwrap());
static LONG_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\d\.\d\d\.\d\d\d\d").unwrap());
static SHORT_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d\d\.\d\d\.\d\d").unwrap());
static TRACK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Gl\.\s*(\d+)").unwrap());
static TRAIN_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+\s*\d+").unwrap());

static LIST_HEADER: LazyLock<Selector> = LazyLock::new(|| selector("div.editBtnCon"));
static LIST_ROW_CELL: LazyLock<Selector> = LazyLock::new(|| selector("td.overview.timelink"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static GREY_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span.grey"));
static BOLD_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span.bold"));
static DELAY_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span.delay"));
static QUERY_SUMMARY: LazyLock<Selector> = LazyLock::new(|| selector("span.querysummary2"));
static ROUTE_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| selector("div.routeStart, div.routeChange, div.routeEnd"));
static TRAIN_SECTION: LazyLock<Selector> = LazyLock::new(|| selector("div.motSection"));
static FORM: LazyLock<Selector> = LazyLock::new(|| selector("form"));
static INPUT: LazyLock<Selector> = LazyLock::new(|| selector("input"));
static SELECT: LazyLock<Selector> = LazyLock::new(|| selector("select"));
static OPTION: LazyLock<Selector> = LazyLock::new(|| selector("option"));

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Returns true if the page asks the user to pick between several stations.
pub fn is_ambiguous(html: &str) -> bool {
    html.contains(AMBIGUOUS_MARKER)
}

/// Extract a connection list page.
///
/// `reference_time` is the "HH:MM" the query was issued for; list pages do
/// not repeat it.
pub fn extract_connection_list(
    html: &str,
    reference_time: &str,
) -> Result<RawConnectionList, ProviderError> {
    let document = Html::parse_document(html);

    let header = document
        .select(&LIST_HEADER)
        .next()
        .ok_or_else(|| ProviderError::format_changed("div.editBtnCon"))?;

    let mut names = header.select(&SPAN).map(collapsed_text);
    let origin = names
        .next()
        .ok_or_else(|| ProviderError::format_changed("origin station name"))?;
    let destination = names
        .next()
        .ok_or_else(|| ProviderError::format_changed("destination station name"))?;

    let date_text = header
        .select(&GREY_SPAN)
        .next()
        .map(collapsed_text)
        .ok_or_else(|| ProviderError::format_changed("span.grey"))?;
    let date = LONG_DATE
        .find(&date_text)
        .ok_or_else(|| ProviderError::format_changed("list date"))?
        .as_str()
        .to_string();

    let rows = document
        .select(&LIST_ROW_CELL)
        .map(|cell| {
            let row = cell
                .parent()
                .and_then(ElementRef::wrap)
                .ok_or_else(|| ProviderError::format_changed("connection row"))?;
            extract_row(row)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawConnectionList {
        date,
        reference_time: reference_time.to_string(),
        origin,
        destination,
        rows,
    })
}

fn extract_row(row: ElementRef<'_>) -> Result<RawConnectionRow, ProviderError> {
    let columns: Vec<ElementRef<'_>> = row.select(&CELL).collect();
    if columns.len() < 4 {
        return Err(ProviderError::format_changed("connection row columns"));
    }

    let link = columns[0]
        .select(&LINK)
        .next()
        .ok_or_else(|| ProviderError::format_changed("connection link"))?;
    let handle = link
        .value()
        .attr("href")
        .ok_or_else(|| ProviderError::format_changed("connection link href"))?
        .to_string();

    let mut times = text_pieces(link);
    let departure_time = times
        .next()
        .ok_or_else(|| ProviderError::format_changed("departure time"))?;
    let arrival_time = times
        .next()
        .ok_or_else(|| ProviderError::format_changed("arrival time"))?;

    let (departure_span, arrival_span) = delay_spans(columns[1]);
    let departure_actual = departure_span.and_then(actual_time);
    let arrival_actual = arrival_span.and_then(actual_time);

    let row_text = collapsed_text(row);
    let cancelled = CANCELLED_MARKERS
        .iter()
        .any(|marker| row_text.contains(marker));

    let products = collapsed_text(columns[3])
        .split(", ")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    Ok(RawConnectionRow {
        handle,
        departure_time,
        arrival_time,
        departure_actual,
        arrival_actual,
        transfers: collapsed_text(columns[2]),
        products,
        cancelled,
    })
}

/// Departure and arrival spans of a delay cell.
///
/// The departure span precedes the line break and the arrival span follows
/// it. A cell without a line break only reports the departure.
fn delay_spans(cell: ElementRef<'_>) -> (Option<ElementRef<'_>>, Option<ElementRef<'_>>) {
    let mut departure = None;
    let mut arrival = None;
    let mut after_break = false;

    for child in cell.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "br" => after_break = true,
            "span" if after_break => {
                arrival.get_or_insert(child);
            }
            "span" => {
                departure.get_or_insert(child);
            }
            _ => {}
        }
    }

    (departure, arrival)
}

/// Reported time in a delay span.
///
/// Empty spans, on-time notices and cancellation notices carry no time.
/// Anything else is handed on verbatim so the builder can reject it.
fn actual_time(span: ElementRef<'_>) -> Option<String> {
    let text = collapsed_text(span);
    if text.is_empty() {
        return None;
    }
    if let Some(m) = TIME_OF_DAY.find(&text) {
        return Some(m.as_str().to_string());
    }
    let on_time = span.value().classes().any(|class| class == ON_TIME_CLASS)
        || ON_TIME_MARKERS.contains(&text.as_str());
    if on_time || CANCELLED_MARKERS.iter().any(|marker| text.contains(marker)) {
        return None;
    }
    Some(text)
}

/// Extract a connection detail page.
pub fn extract_connection_detail(html: &str) -> Result<RawConnectionDetail, ProviderError> {
    let document = Html::parse_document(html);

    let summary = document
        .select(&QUERY_SUMMARY)
        .next()
        .map(collapsed_text)
        .ok_or_else(|| ProviderError::format_changed("span.querysummary2"))?;
    let date = SHORT_DATE
        .find(&summary)
        .ok_or_else(|| ProviderError::format_changed("query summary date"))?
        .as_str()
        .to_string();
    let reference_time = TIME_OF_DAY
        .find(&summary)
        .ok_or_else(|| ProviderError::format_changed("query summary time"))?
        .as_str()
        .to_string();

    let endpoints = document
        .select(&ROUTE_BLOCK)
        .filter(|block| !collapsed_text(*block).is_empty())
        .map(extract_endpoint)
        .collect::<Result<Vec<_>, _>>()?;

    let trains = document
        .select(&TRAIN_SECTION)
        .map(|section| {
            let text = section
                .select(&BOLD_SPAN)
                .next()
                .map(collapsed_text)
                .ok_or_else(|| ProviderError::format_changed("train name"))?;
            TRAIN_TOKEN
                .find(&text)
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| ProviderError::format_changed("train designator"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if trains.is_empty() || endpoints.len() != 2 * trains.len() {
        return Err(ProviderError::format_changed("route blocks"));
    }

    let mut endpoints = endpoints.into_iter();
    let legs = trains
        .into_iter()
        .filter_map(|train| {
            let departure = endpoints.next()?;
            let arrival = endpoints.next()?;
            Some(RawLeg {
                departure,
                arrival,
                train,
            })
        })
        .collect();

    Ok(RawConnectionDetail {
        date,
        reference_time,
        legs,
    })
}

fn extract_endpoint(block: ElementRef<'_>) -> Result<RawEndpoint, ProviderError> {
    let station = block
        .select(&BOLD_SPAN)
        .next()
        .and_then(|span| text_pieces(span).next())
        .ok_or_else(|| ProviderError::format_changed("station name"))?;

    let text = collapsed_text(block);
    let time = TIME_OF_DAY
        .find(&text)
        .ok_or_else(|| ProviderError::format_changed("scheduled time"))?
        .as_str()
        .to_string();

    let track = TRACK
        .captures(&text)
        .map(|captures| captures[1].to_string());

    let actual_time = block
        .select(&DELAY_SPAN)
        .next()
        .map(collapsed_text)
        .and_then(|delay| TIME_OF_DAY.find(&delay).map(|m| m.as_str().to_string()));

    Ok(RawEndpoint {
        station,
        time,
        track,
        actual_time,
    })
}

/// Extract the station disambiguation form.
pub fn extract_disambiguation_form(html: &str) -> Result<DisambiguationForm, ProviderError> {
    let document = Html::parse_document(html);

    let action = document
        .select(&FORM)
        .next()
        .and_then(|form| form.value().attr("action"))
        .ok_or_else(|| ProviderError::format_changed("disambiguation form"))?
        .to_string();

    let fields = document
        .select(&INPUT)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value")?;
            (!SKIPPED_FORM_FIELDS.contains(&name)).then(|| (name.to_string(), value.to_string()))
        })
        .collect();

    let choices = document
        .select(&SELECT)
        .filter_map(|select| {
            let field = select.value().attr("name")?.to_string();
            let options = select
                .select(&OPTION)
                .filter_map(|option| {
                    let value = option.value().attr("value")?.to_string();
                    Some(SelectOption {
                        value,
                        label: collapsed_text(option),
                    })
                })
                .collect();
            Some(StationChoice { field, options })
        })
        .collect();

    Ok(DisambiguationForm {
        action,
        fields,
        choices,
    })
}

/// All text below `element`, with runs of whitespace collapsed to one space.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-blank text nodes below `element`, trimmed.
fn text_pieces<'a>(element: ElementRef<'a>) -> impl Iterator<Item = String> + 'a {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(String::from)
}
