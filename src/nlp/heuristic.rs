// Rule-based sentence segmentation and named-entity recognition
use regex::Regex;

use super::{Analysis, Analyzer, EntityLabel, EntitySpan};
use crate::nlp::stopwords::is_stop_word;

const MONTHS: &str = r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)";

const ABBREVIATIONS: &[&str] = &[
    "approx", "dr", "e.g", "fig", "ft", "gen", "gov", "i.e", "jr", "mr", "mrs", "ms", "mt",
    "no", "prof", "rep", "sen", "sr", "st", "u.k", "u.s", "vs",
];

const HONORIFICS: &[&str] = &[
    "Chancellor", "Dr", "Governor", "Judge", "Justice", "Lord", "Mr", "Mrs", "Ms", "President",
    "Prof", "Professor", "Senator", "Sir",
];

const CONNECTORS: &[&str] = &["&", "de", "for", "of", "the", "von"];

const ORG_SUFFIXES: &[&str] = &[
    "Agency", "Association", "Bank", "Co", "Commission", "Committee", "Company", "Corp",
    "Corporation", "Council", "Department", "Foundation", "Group", "Inc", "Institute", "LLC",
    "LLP", "Ltd", "Ministry", "Partners", "PLC", "Services", "Systems", "Technologies",
    "University",
];

const LAW_KEYWORDS: &[&str] = &[
    "Act", "Amendment", "Article", "Bill", "Code", "Constitution", "Convention", "Directive",
    "Law", "Regulation", "Section", "Statute", "Treaty",
];

const FAC_KEYWORDS: &[&str] = &[
    "Airport", "Bridge", "Building", "Cathedral", "Museum", "Palace", "Stadium", "Station",
    "Tower",
];

const LOC_KEYWORDS: &[&str] = &[
    "Bay", "Desert", "Island", "Islands", "Lake", "Mountain", "Mountains", "Ocean", "River",
    "Sea", "Valley",
];

const EVENT_KEYWORDS: &[&str] = &["Championship", "Cup", "Games", "Olympics", "Revolution", "War"];

const NORP: &[&str] = &[
    "American", "British", "Chinese", "Christian", "Democrat", "Democrats", "Dutch", "English",
    "European", "French", "German", "Indian", "Italian", "Japanese", "Jewish", "Muslim",
    "Republican", "Republicans", "Russian", "Spanish",
];

const GPE: &[&str] = &[
    "africa", "amsterdam", "argentina", "asia", "athens", "australia", "austria", "beijing",
    "belgium", "berlin", "boston", "brazil", "brussels", "california", "canada", "chicago",
    "china", "cupertino", "denmark", "dublin", "egypt", "england", "europe", "finland",
    "florida", "france", "germany", "greece", "houston", "india", "ireland", "israel",
    "italy", "japan", "london", "los angeles", "madrid", "mexico", "moscow", "netherlands",
    "new york", "new york city", "norway", "oregon", "paris", "poland", "portugal", "rome",
    "russia", "san francisco", "scotland", "seattle", "spain", "sweden", "switzerland",
    "texas", "tokyo", "u.k", "u.s", "uk", "united kingdom", "united states", "us", "usa",
    "washington", "wales",
];

/// Built-in analyzer: punctuation-driven sentence splitting and pattern NER.
///
/// Precision is modest; the knowledge-base disambiguation downstream absorbs
/// most label noise.
pub struct HeuristicAnalyzer {
    paragraph_break: Regex,
    word: Regex,
    dates: Vec<Regex>,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self {
            paragraph_break: pattern(r"\n\s*\n"),
            word: pattern(r"[\p{L}\p{N}]+(?:['’.&\-][\p{L}\p{N}]+)*|&"),
            dates: vec![
                pattern(&format!(
                    r"\b{m}\.?\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?\b",
                    m = MONTHS
                )),
                pattern(&format!(
                    r"\b\d{{1,2}}(?:st|nd|rd|th)?\s+{m}\.?,?\s+\d{{4}}\b",
                    m = MONTHS
                )),
                pattern(&format!(r"\b{m}\.?,?\s+\d{{4}}\b", m = MONTHS)),
                pattern(r"\b\d{4}-\d{2}-\d{2}\b"),
                pattern(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b"),
                pattern(r"\b(?:1[5-9]\d{2}|20\d{2})s?\b"),
            ],
        }
    }

    fn split_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();

        for paragraph in self.paragraph_break.split(text) {
            let chars: Vec<(usize, char)> = paragraph.char_indices().collect();
            let mut start = 0;
            let mut i = 0;

            while i < chars.len() {
                let c = chars[i].1;
                if !matches!(c, '.' | '!' | '?') {
                    i += 1;
                    continue;
                }

                let mut j = i + 1;
                while j < chars.len()
                    && matches!(chars[j].1, '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '”' | '’')
                {
                    j += 1;
                }
                if j == chars.len() || !chars[j].1.is_whitespace() {
                    i = j;
                    continue;
                }

                let mut k = j;
                while k < chars.len() && chars[k].1.is_whitespace() {
                    k += 1;
                }
                let opens_sentence = k == chars.len() || {
                    let next = chars[k].1;
                    next.is_uppercase()
                        || next.is_ascii_digit()
                        || matches!(next, '"' | '\'' | '(' | '[' | '“' | '‘')
                };
                let abbreviated = c == '.' && ends_with_abbreviation(&paragraph[start..chars[i].0]);

                if opens_sentence && !abbreviated {
                    push_sentence(&mut sentences, &paragraph[start..chars[j].0]);
                    start = if k == chars.len() {
                        paragraph.len()
                    } else {
                        chars[k].0
                    };
                }
                i = k;
            }

            push_sentence(&mut sentences, &paragraph[start..]);
        }

        sentences
    }

    fn entities_in(&self, sentence: &str) -> Vec<EntitySpan> {
        let mut spans = Vec::new();

        let mut date_ranges: Vec<(usize, usize)> = Vec::new();
        for date in &self.dates {
            for found in date.find_iter(sentence) {
                let overlaps = date_ranges
                    .iter()
                    .any(|(s, e)| found.start() < *e && *s < found.end());
                if !overlaps {
                    date_ranges.push((found.start(), found.end()));
                }
            }
        }
        date_ranges.sort();
        for (start, end) in &date_ranges {
            spans.push((
                *start,
                EntitySpan {
                    text: sentence[*start..*end].to_string(),
                    label: EntityLabel::Date,
                    sentence: sentence.to_string(),
                },
            ));
        }

        let tokens: Vec<Token> = self
            .word
            .find_iter(sentence)
            .filter(|m| !date_ranges.iter().any(|(s, e)| m.start() < *e && *s < m.end()))
            .map(|m| Token {
                start: m.start(),
                end: m.end(),
                text: m.as_str(),
            })
            .collect();

        for run in name_runs(sentence, &tokens) {
            if let Some((start, span)) = classify_run(sentence, &tokens, &run) {
                spans.push((start, span));
            }
        }

        spans.sort_by_key(|(start, _)| *start);
        spans.into_iter().map(|(_, span)| span).collect()
    }
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for HeuristicAnalyzer {
    fn analyze(&self, text: &str) -> Analysis {
        let sentences = self.split_sentences(text);
        let entities = sentences
            .iter()
            .flat_map(|sentence| self.entities_in(sentence))
            .collect();

        Analysis {
            sentences,
            entities,
        }
    }

    fn sentences(&self, text: &str) -> Vec<String> {
        self.split_sentences(text)
    }
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("static pattern compiles")
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        sentences.push(collapsed);
    }
}

fn ends_with_abbreviation(prefix: &str) -> bool {
    let last = prefix
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    let is_initial = last.chars().count() == 1 && last.chars().all(char::is_uppercase);
    is_initial || ABBREVIATIONS.contains(&last.to_lowercase().as_str())
}

fn is_name_token(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => text != "I",
        Some(first) if first.is_lowercase() => is_product_like(text),
        _ => false,
    }
}

/// `iPhone`, `eBay`, `MacBook`, `PlayStation`
fn is_product_like(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 3 || is_acronym(text) {
        return false;
    }
    if chars[0].is_lowercase() {
        return chars[1..].iter().any(|c| c.is_uppercase());
    }
    chars
        .windows(2)
        .skip(1)
        .any(|w| w[0].is_lowercase() && w[1].is_uppercase())
}

fn is_acronym(text: &str) -> bool {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 2
        && text
            .chars()
            .all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '.' || c == '&')
}

fn is_connector(text: &str) -> bool {
    CONNECTORS.contains(&text)
}

/// Maximal runs of name-like tokens separated only by whitespace
fn name_runs(sentence: &str, tokens: &[Token]) -> Vec<Vec<usize>> {
    let mut runs = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        let adjacent = current
            .last()
            .map(|&prev| {
                let gap = sentence[tokens[prev].end..token.start].trim();
                gap.is_empty() || (gap == "." && HONORIFICS.contains(&tokens[prev].text))
            })
            .unwrap_or(true);
        if !adjacent && !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }

        let extends = if is_name_token(token.text) {
            true
        } else if current.is_empty() {
            false
        } else if token.text.chars().all(|c| c.is_ascii_digit()) {
            current
                .last()
                .map(|&prev| LAW_KEYWORDS.contains(&tokens[prev].text))
                .unwrap_or(false)
        } else if is_connector(token.text) {
            let after_product = current
                .last()
                .map(|&prev| is_product_like(tokens[prev].text))
                .unwrap_or(false);
            !after_product
                && tokens
                    .get(index + 1)
                    .map(|next| {
                        is_name_token(next.text)
                            && sentence[token.end..next.start].trim().is_empty()
                    })
                    .unwrap_or(false)
        } else {
            false
        };

        if extends {
            current.push(index);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn classify_run(sentence: &str, tokens: &[Token], run: &[usize]) -> Option<(usize, EntitySpan)> {
    let mut run: Vec<usize> = run.to_vec();
    let mut honorific = false;

    while let Some(&first) = run.first() {
        let text = tokens[first].text;
        if HONORIFICS.contains(&text) && run.len() > 1 {
            honorific = true;
            run.remove(0);
        } else if is_stop_word(text) || is_connector(text) {
            run.remove(0);
        } else {
            break;
        }
    }
    while run.last().map(|&i| is_connector(tokens[i].text)).unwrap_or(false) {
        run.pop();
    }

    let first = *run.first()?;
    let last = *run.last()?;
    let words: Vec<&str> = run.iter().map(|&i| tokens[i].text).collect();
    let text = &sentence[tokens[first].start..tokens[last].end];

    let sentence_initial = first == 0;
    let gazetteer_hit = GPE.contains(&text.to_lowercase().as_str());
    if sentence_initial
        && words.len() == 1
        && !honorific
        && !gazetteer_hit
        && !is_acronym(words[0])
        && !is_product_like(words[0])
    {
        return None;
    }

    let any_word = |list: &[&str]| words.iter().any(|w| list.contains(w));
    let last_word = words[words.len() - 1];

    let label = if honorific {
        EntityLabel::Person
    } else if words.len() == 1 && is_product_like(words[0]) {
        EntityLabel::Product
    } else if ORG_SUFFIXES.contains(&last_word) {
        EntityLabel::Org
    } else if any_word(LAW_KEYWORDS) {
        EntityLabel::Law
    } else if any_word(FAC_KEYWORDS) {
        EntityLabel::Fac
    } else if any_word(LOC_KEYWORDS) {
        EntityLabel::Loc
    } else if any_word(EVENT_KEYWORDS) {
        EntityLabel::Event
    } else if gazetteer_hit {
        EntityLabel::Gpe
    } else if words.len() == 1 && NORP.contains(&words[0]) {
        EntityLabel::Norp
    } else if words.iter().all(|w| is_acronym(w)) {
        EntityLabel::Org
    } else if (2..=3).contains(&words.len()) && !words.iter().any(|w| is_connector(w)) {
        EntityLabel::Person
    } else {
        EntityLabel::Org
    };

    Some((
        tokens[first].start,
        EntitySpan {
            text: text.to_string(),
            label,
            sentence: sentence.to_string(),
        },
    ))
}
