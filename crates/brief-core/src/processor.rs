//! Article clean-up before summarization.
//!
//! NewsAPI descriptions are short and noisy: agency credits, "read more"
//! prompts, copyright lines, HTML fragments. The processor drops articles that
//! carry no usable content, strips the noise from the rest and condenses each
//! one into a short "core" (key sentences, numeric facts, one quote) that is
//! stuffed into the model prompt.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;

use crate::models::Article;

const MIN_TITLE_CHARS: usize = 15;
const MIN_CONTENT_CHARS: usize = 50;
const MIN_KEPT_SENTENCE_CHARS: usize = 25;
const MAX_CORE_CHARS: usize = 500;
const REDUNDANCY_THRESHOLD: f64 = 0.6;

const BOILERPLATE_PHRASES: &[&str] = &[
    // Read more prompts
    "Continua a leggere", "Leggi tutto", "Read more", "Weiterlesen", "Lire la suite",
    "Leer más", "Read the full story", "Full story",
    // Promotional
    "Per saperne di più", "Scopri di più", "Pubblicità", "Sponsorizzato",
    "Advertisement", "Advert", "Werbung", "Publicidad", "Annonce",
    // Social and navigation
    "Follow us", "Subscribe", "Newsletter", "Sign up", "Condividi", "Share", "Teilen",
    "Partager", "Compartir", "Back to top", "Login",
    // Rights
    "RIPRODUZIONE RISERVATA", "TUTTI I DIRITTI RISERVATI", "All rights reserved",
    "Alle Rechte vorbehalten", "Tous droits réservés",
];

const BOILERPLATE_PATTERNS: &[&str] = &[
    // Agency credits
    r"\((?:ANSA|Reuters|AFP|AP|Bloomberg|CNN|BBC|DW|Le Monde|El País)\)",
    // Attribution labels
    r"\b(?:Fonte|Source|Quelle|Fuente|FOTO|PHOTO|VIDEO|Image|Bild|Imagen):",
    r"©.*",
    r"\bCopyright.*",
    r"\.{3,}",
    r"…+",
];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

const FILLER_WORDS: &[&str] = &[
    "click", "read", "discover", "learn", "subscribe", "follow", "share", "like", "comment",
    "download", "install", "buy", "purchase", "shop", "order", "get", "find", "watch",
    "listen", "play", "join", "register", "signup", "try", "visit",
];

const PROMOTIONAL_WORDS: &[&str] = &[
    "offerta", "sconto", "promozione", "acquista", "compra", "vendita", "prezzo",
    "offer", "discount", "promotion", "buy", "purchase", "sale", "price", "deal",
    "angebot", "rabatt", "aktion", "kaufen", "verkauf", "preis",
    "offre", "réduction", "acheter", "vente", "prix",
    "oferta", "descuento", "promoción", "comprar", "venta", "precio",
];

const INFORMATIVE_VERBS: &[&str] = &[
    "announced", "confirmed", "reported", "stated", "declared", "revealed", "disclosed",
    "unveiled", "presented", "died", "elected", "approved", "rejected", "signed",
    "launched", "started", "completed", "found", "discovered", "increased", "decreased",
    "won", "lost", "agreed", "decided", "voted", "passed", "failed", "reached", "grew",
    "fell", "rose", "dropped", "expanded", "contracted", "improved", "worsened",
    "strengthened", "weakened", "changed", "modified",
    "annunciato", "confermato", "riferito", "dichiarato", "rivelato", "morto", "eletto",
    "approvato", "respinto", "firmato", "lanciato",
    "annoncé", "confirmé", "rapporté", "déclaré", "révélé",
    "angekündigt", "bestätigt", "gemeldet", "erklärt", "enthüllt",
    "anunciado", "confirmado", "informado", "declarado", "revelado",
];

const NUMBER_PATTERNS: &[&str] = &[
    r"\$\d+[\d,]*\.?\d*\s*(?:million|billion|trillion)?",
    r"\d+[\d,]*\.?\d*\s*(?:percent|%)",
    r"\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)",
    r"\b\d{4}\b",
];

const QUOTE_PATTERNS: &[&str] = &[
    r#""[^"]{10,}""#,
    r"'[^']{10,}'",
    r"«[^»]{10,}»",
    r"„[^“]{10,}“",
];

/// Per-outlet clean-up rules: (source name fragment, patterns to remove).
const SOURCE_RULES: &[(&str, &[&str])] = &[
    ("ansa", &[r"\bANSA\b"]),
    ("reuters", &[r"\bReuters\b"]),
    ("bbc", &[r"Image source,.*?\.", r"Media caption,.*?\."]),
    ("cnn", &[r"CNN.*?—", r"Updated:\W*"]),
    ("fox news", &[r"Fox News.*?—"]),
    ("the guardian", &[r"Photograph:.*?\."]),
];

pub struct ArticleProcessor {
    boilerplate: Regex,
    whitespace: Regex,
    sentence_end: Regex,
    word: Regex,
    full_name: Regex,
    numbers: Vec<Regex>,
    quotes: Vec<Regex>,
    quote_marks: Regex,
    source_rules: Vec<(&'static str, Vec<Regex>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
}

impl ArticleProcessor {
    pub fn new() -> Result<Self> {
        let mut alternatives: Vec<String> = BOILERPLATE_PATTERNS.iter().map(|p| p.to_string()).collect();
        alternatives.extend(
            BOILERPLATE_PHRASES
                .iter()
                .map(|phrase| format!(r"\b{}\b", regex::escape(phrase))),
        );
        let boilerplate = Regex::new(&format!("(?i){}", alternatives.join("|")))
            .context("Failed to compile boilerplate pattern")?;

        let compile_all = |patterns: &[&str], flags: &str| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(&format!("{}{}", flags, p))
                        .with_context(|| format!("Failed to compile pattern {}", p))
                })
                .collect()
        };

        let mut source_rules = Vec::new();
        for (source, patterns) in SOURCE_RULES {
            source_rules.push((*source, compile_all(*patterns, "(?i)")?));
        }

        Ok(Self {
            boilerplate,
            whitespace: Regex::new(r"\s+")?,
            sentence_end: Regex::new(r"[.!?]+")?,
            word: Regex::new(r"\b\w+\b")?,
            full_name: Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b")?,
            numbers: compile_all(NUMBER_PATTERNS, "(?i)")?,
            quotes: compile_all(QUOTE_PATTERNS, "")?,
            quote_marks: Regex::new(r#"^["'«„]|["'»“]$"#)?,
            source_rules,
        })
    }

    /// Keep the articles worth summarizing, each paired with its condensed core.
    pub fn extract_cores<'a>(&self, articles: &'a [Article]) -> Vec<(&'a Article, String)> {
        let mut cores = Vec::new();

        for article in articles {
            let content = self.normalize_markup(&article.content);
            if !self.is_valid(&article.title, &content) {
                tracing::debug!(title = %article.title, "skipping article without usable content");
                continue;
            }

            let clean = self.clean_content(&content, &article.source);
            cores.push((article, self.extract_core(article.title.trim(), &clean)));
        }

        tracing::info!(
            processed = cores.len(),
            skipped = articles.len() - cores.len(),
            "prepared articles for summarization"
        );
        cores
    }

    pub fn stats(&self, articles: &[Article]) -> ProcessingStats {
        let processed = self.extract_cores(articles).len();
        ProcessingStats {
            total: articles.len(),
            processed,
            skipped: articles.len() - processed,
        }
    }

    /// Render the kept articles as numbered blocks for the prompt context.
    pub fn prepare_context(&self, cores: &[(&Article, String)]) -> String {
        cores
            .iter()
            .enumerate()
            .map(|(i, (article, core))| {
                format!(
                    "ARTICLE {}: {}\nSOURCE: {}\nCATEGORY: {}\nDATE: {}\nCONTENT EXTRACT: {}",
                    i + 1,
                    article.title,
                    article.source,
                    article.category_name(),
                    article.published_at.format("%Y-%m-%d %H:%M"),
                    core
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn is_valid(&self, title: &str, content: &str) -> bool {
        let title = title.trim();
        let content = content.trim();

        if title.is_empty()
            || title == "[Removed]"
            || title.chars().count() < MIN_TITLE_CHARS
            || title.to_uppercase() == title
        {
            return false;
        }

        if content.is_empty()
            || content == "No content"
            || content.chars().count() < MIN_CONTENT_CHARS
            || self.is_redundant(title, content)
        {
            return false;
        }

        !self.is_low_quality(content)
    }

    fn is_redundant(&self, title: &str, content: &str) -> bool {
        let title_words = self.content_words(title);
        if title_words.is_empty() {
            return false;
        }
        let content_words = self.content_words(content);

        let overlap = title_words.intersection(&content_words).count();
        overlap as f64 / title_words.len() as f64 > REDUNDANCY_THRESHOLD
    }

    fn content_words(&self, text: &str) -> HashSet<String> {
        self.word
            .find_iter(&text.to_lowercase())
            .map(|m| m.as_str().to_string())
            .filter(|w| !STOP_WORDS.contains(&w.as_str()))
            .collect()
    }

    fn is_low_quality(&self, content: &str) -> bool {
        let words = self.lowercase_words(content);

        let promotional = PROMOTIONAL_WORDS.iter().filter(|w| words.contains(**w)).count();
        if promotional > 3 {
            return true;
        }

        let filler = FILLER_WORDS.iter().filter(|w| words.contains(**w)).count();
        if filler > 5 {
            return true;
        }

        let sentences: Vec<&str> = content
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let short = sentences
            .iter()
            .filter(|s| s.split_whitespace().count() < 4)
            .count();

        short as f64 > sentences.len() as f64 * 0.5
    }

    fn lowercase_words(&self, text: &str) -> HashSet<String> {
        self.word
            .find_iter(&text.to_lowercase())
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn normalize_markup(&self, content: &str) -> String {
        if content.contains('<') && content.contains('>') {
            html2text::from_read(content.as_bytes(), 10_000)
        } else {
            content.to_string()
        }
    }

    pub fn clean_content(&self, content: &str, source: &str) -> String {
        if content.trim().is_empty() {
            return String::new();
        }

        let mut text = self.boilerplate.replace_all(content, "").into_owned();

        let source_lower = source.to_lowercase();
        for (fragment, patterns) in &self.source_rules {
            if source_lower.contains(fragment) {
                for pattern in patterns {
                    text = pattern.replace_all(&text, "").into_owned();
                }
            }
        }

        let text = self.whitespace.replace_all(&text, " ");

        self.sentence_end
            .split(text.trim())
            .map(str::trim)
            .filter(|s| s.chars().count() > MIN_KEPT_SENTENCE_CHARS)
            .collect::<Vec<_>>()
            .join(". ")
    }

    pub fn extract_core(&self, title: &str, content: &str) -> String {
        if content.is_empty() {
            return title.to_string();
        }

        let mut parts = Vec::new();

        let key_sentences = self.key_sentences(content);
        if !key_sentences.is_empty() {
            parts.push(key_sentences.iter().take(2).cloned().collect::<Vec<_>>().join(". "));
        }

        let facts = self.factual_information(content);
        if !facts.is_empty() {
            parts.push(facts.iter().take(2).cloned().collect::<Vec<_>>().join(" | "));
        }

        if let Some(quote) = self.quotes(content).into_iter().next() {
            parts.push(format!("Quotes: {}", quote));
        }

        if parts.is_empty() && content.chars().count() > MIN_CONTENT_CHARS {
            if let Some(first) = content.split('.').map(str::trim).find(|s| s.chars().count() > 30) {
                parts.push(format!("{}...", first));
            }
        }

        if parts.is_empty() {
            return title.to_string();
        }

        let mut core = parts.join(" ");
        if core.chars().count() > MAX_CORE_CHARS {
            core = core.chars().take(MAX_CORE_CHARS).collect::<String>() + "...";
        }
        format!("{} | {}", title, core)
    }

    fn key_sentences(&self, content: &str) -> Vec<String> {
        let mut scored: Vec<(f64, &str)> = self
            .sentence_end
            .split(content)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| (self.score_sentence(s), s))
            .filter(|(score, _)| *score > 0.3)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(4).map(|(_, s)| s.to_string()).collect()
    }

    fn score_sentence(&self, sentence: &str) -> f64 {
        let lower = sentence.to_lowercase();
        let words: HashSet<&str> = lower.split_whitespace().collect();
        if lower.split_whitespace().count() < 6 {
            return 0.0;
        }

        let mut score = 0.0;

        if INFORMATIVE_VERBS.iter().any(|v| lower.contains(v)) {
            score += 0.4;
        }

        if sentence.chars().any(|c| c.is_ascii_digit()) {
            score += 0.3;
        }

        let proper_nouns = sentence
            .split_whitespace()
            .filter(|w| w.chars().count() > 2 && is_title_case(w))
            .count();
        score += (proper_nouns as f64 * 0.05).min(0.2);

        if self.is_promotional(&words) {
            score -= 0.5;
        }

        let filler = FILLER_WORDS.iter().filter(|w| words.contains(**w)).count();
        score -= filler as f64 * 0.1;

        score.max(0.0)
    }

    fn is_promotional(&self, words: &HashSet<&str>) -> bool {
        PROMOTIONAL_WORDS.iter().any(|w| words.contains(w))
            || FILLER_WORDS.iter().filter(|w| words.contains(**w)).count() >= 2
    }

    fn factual_information(&self, content: &str) -> Vec<String> {
        let mut facts = Vec::new();

        for pattern in &self.numbers {
            for m in pattern.find_iter(content).take(2) {
                let fact = m.as_str().trim();
                match self.fact_context(content, fact) {
                    Some(context) => facts.push(format!("{} ({})", fact, context)),
                    None => facts.push(fact.to_string()),
                }
            }
        }

        facts.extend(
            self.full_name
                .find_iter(content)
                .take(2)
                .map(|m| m.as_str().to_string()),
        );

        facts.truncate(3);
        facts
    }

    fn fact_context(&self, content: &str, fact: &str) -> Option<String> {
        self.sentence_end
            .split(content)
            .map(str::trim)
            .find(|s| s.contains(fact))
            .map(|s| format!("{}...", s.split_whitespace().take(7).collect::<Vec<_>>().join(" ")))
    }

    fn quotes(&self, content: &str) -> Vec<String> {
        let mut quotes = Vec::new();

        for pattern in &self.quotes {
            for m in pattern.find_iter(content) {
                let clean = self.quote_marks.replace_all(m.as_str(), "").trim().to_string();
                if clean.split_whitespace().count() >= 4 {
                    quotes.push(clean);
                }
            }
            if quotes.len() >= 2 {
                break;
            }
        }

        quotes.truncate(2);
        quotes
    }
}

fn is_title_case(word: &str) -> bool {
    let mut chars = word.chars().filter(|c| c.is_alphabetic());
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| c.is_lowercase()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn processor() -> ArticleProcessor {
        ArticleProcessor::new().unwrap()
    }

    fn article(title: &str, content: &str, source: &str) -> Article {
        Article {
            id: "news_0".to_string(),
            title: title.to_string(),
            source: source.to_string(),
            published_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 5, 0).unwrap(),
            url: "https://example.com/story".to_string(),
            content: content.to_string(),
            category: None,
        }
    }

    const GOOD_CONTENT: &str = "Lawmakers approved a spending package worth $12 billion on Tuesday after weeks of negotiation. \
        Finance Minister Maria Rossi said the plan would lift growth by 2 percent in 2027.";

    // ==================== Validity Tests ====================

    #[test]
    fn test_valid_article_passes() {
        assert!(processor().is_valid("Budget deal reached in Rome", GOOD_CONTENT));
    }

    #[test]
    fn test_short_or_shouting_titles_are_rejected() {
        let p = processor();
        assert!(!p.is_valid("Short title", GOOD_CONTENT));
        assert!(!p.is_valid("BREAKING NEWS FROM ROME TODAY", GOOD_CONTENT));
        assert!(!p.is_valid("[Removed]", GOOD_CONTENT));
    }

    #[test]
    fn test_short_content_is_rejected() {
        assert!(!processor().is_valid("Budget deal reached in Rome", "Too short."));
        assert!(!processor().is_valid("Budget deal reached in Rome", "No content"));
    }

    #[test]
    fn test_redundant_content_is_rejected() {
        let title = "Budget deal reached in Rome parliament";
        let content = "Budget deal reached in Rome parliament tonight, with everyone in the room watching it.";
        assert!(!processor().is_valid(title, content));
    }

    #[test]
    fn test_promotional_content_is_rejected() {
        let content = "Huge discount on every deal this week at the store near you. \
            The best price and a special offer for every buyer who visits the sale event.";
        assert!(!processor().is_valid("Shopping weekend arrives in town", content));
    }

    #[test]
    fn test_fragmented_content_is_rejected() {
        let content = "Rome. Tuesday. Budget. Big news. Lawmakers gathered in the capital city to vote on it.";
        assert!(!processor().is_valid("Budget deal reached in Rome", content));
    }

    // ==================== Cleaning Tests ====================

    #[test]
    fn test_clean_removes_boilerplate_and_short_sentences() {
        let content = "(ANSA) The central bank raised interest rates by half a point today. Read more... \
            Short one. © 2026 All rights reserved";
        let clean = processor().clean_content(content, "ANSA");
        assert_eq!(clean, "The central bank raised interest rates by half a point today");
    }

    #[test]
    fn test_clean_keeps_words_containing_phrases() {
        let clean = processor().clean_content(
            "Shareholders returned home after the annual meeting ended in Milan",
            "Example",
        );
        assert!(clean.contains("Shareholders returned home"));
    }

    #[test]
    fn test_clean_applies_source_rules() {
        let clean = processor().clean_content(
            "Image source, Getty. The prime minister travelled to Brussels for the summit talks",
            "BBC News",
        );
        assert!(!clean.contains("Getty"));
        assert!(clean.contains("The prime minister travelled to Brussels"));
    }

    #[test]
    fn test_html_descriptions_are_flattened() {
        let p = processor();
        let a = article(
            "Budget deal reached in Rome",
            "<p>Lawmakers approved a spending package worth $12 billion on Tuesday after weeks of negotiation.</p>",
            "Example",
        );
        let cores = p.extract_cores(std::slice::from_ref(&a));
        assert_eq!(cores.len(), 1);
        assert!(!cores[0].1.contains("<p>"));
    }

    // ==================== Core Extraction Tests ====================

    #[test]
    fn test_core_starts_with_title_and_keeps_facts() {
        let p = processor();
        let clean = p.clean_content(GOOD_CONTENT, "Example");
        let core = p.extract_core("Budget deal reached in Rome", &clean);

        assert!(core.starts_with("Budget deal reached in Rome | "));
        assert!(core.contains("approved a spending package"));
        assert!(core.contains("$12 billion"));
    }

    #[test]
    fn test_core_extracts_quote() {
        let p = processor();
        let content = "The minister announced the reform on Monday in front of reporters. \
            She told the crowd \"this reform will change the country for a generation\" before leaving";
        let core = p.extract_core("Reform announced by minister", content);
        assert!(core.contains("Quotes: this reform will change the country for a generation"));
    }

    #[test]
    fn test_core_is_capped() {
        let p = processor();
        let sentence = "Officials announced on Monday that 2026 revenue increased sharply across Europe";
        let content = vec![sentence; 20].join(". ");
        let core = p.extract_core("A long running story", &content);
        let body = core.split_once(" | ").unwrap().1;
        assert!(body.chars().count() <= MAX_CORE_CHARS + 3);
    }

    #[test]
    fn test_core_without_content_is_title() {
        assert_eq!(processor().extract_core("Title only story", ""), "Title only story");
    }

    // ==================== Context Tests ====================

    #[test]
    fn test_prepare_context_numbers_articles() {
        let p = processor();
        let articles = vec![
            article("Budget deal reached in Rome", GOOD_CONTENT, "ANSA"),
            article("Tiny", "nothing", "ANSA"),
        ];
        let cores = p.extract_cores(&articles);
        assert_eq!(cores.len(), 1);

        let context = p.prepare_context(&cores);
        assert!(context.starts_with("ARTICLE 1: Budget deal reached in Rome\nSOURCE: ANSA\n"));
        assert!(context.contains("CATEGORY: General"));
        assert!(context.contains("DATE: 2026-02-01 09:05"));
        assert!(context.contains("CONTENT EXTRACT: Budget deal reached in Rome | "));
    }

    #[test]
    fn test_stats() {
        let p = processor();
        let articles = vec![
            article("Budget deal reached in Rome", GOOD_CONTENT, "ANSA"),
            article("Tiny", "nothing", "ANSA"),
        ];
        assert_eq!(
            p.stats(&articles),
            ProcessingStats {
                total: 2,
                processed: 1,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_title_case_detection() {
        assert!(is_title_case("Rome"));
        assert!(is_title_case("Rome,"));
        assert!(!is_title_case("NASA"));
        assert!(!is_title_case("rome"));
    }
}
