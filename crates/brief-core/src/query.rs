//! Search parameters offered to the user and their translation into a
//! news-search query: per-language keyword groups, date windows and
//! category detection for returned articles.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Politics,
    Economy,
    Technology,
    Science,
    Health,
    Sports,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Politics,
        Category::Economy,
        Category::Technology,
        Category::Science,
        Category::Health,
        Category::Sports,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Politics => "Politics",
            Category::Economy => "Economy",
            Category::Technology => "Technology",
            Category::Science => "Science",
            Category::Health => "Health",
            Category::Sports => "Sports",
        }
    }

    /// OR-joined search keywords for this category in the given language.
    /// Unknown languages fall back to English.
    pub fn search_terms(&self, language: &str) -> &'static str {
        match (language, self) {
            ("it", Category::Politics) => "governo OR parlamento OR senato OR ministro OR elezioni OR partito OR coalizione OR maggioranza OR opposizione OR legge OR decreto",
            ("it", Category::Economy) => "pil OR inflazione OR borsa OR finanza OR mercato OR azionario OR banca OR investimenti OR recessione OR crescita OR deficit OR debito",
            ("it", Category::Technology) => "intelligenza artificiale OR IA OR algoritmo OR software OR hardware OR digitale OR startup OR innovazione OR tech OR cybersecurity OR blockchain",
            ("it", Category::Science) => "ricerca OR scoperta OR studio OR esperimento OR laboratorio OR scientifico OR pubblicazione OR accademia OR fisica OR chimica OR biologia",
            ("it", Category::Health) => "medicina OR ospedale OR paziente OR malattia OR cura OR terapia OR vaccino OR farmaco OR chirurgia OR diagnosi OR prevenzione OR sanitario",
            ("it", Category::Sports) => "calcio OR serieA OR partita OR gol OR squadra OR atleta OR campionato OR gara OR competizione OR olimpiadi OR allenamento OR risultato",

            ("fr", Category::Politics) => "gouvernement OR parlement OR sénat OR ministre OR élections OR parti OR coalition OR majorité OR opposition OR loi OR décret",
            ("fr", Category::Economy) => "pib OR inflation OR bourse OR finance OR marché OR actions OR banque OR investissements OR récession OR croissance OR déficit OR dette",
            ("fr", Category::Technology) => "intelligence artificielle OR IA OR algorithme OR logiciel OR matériel OR numérique OR startup OR innovation OR tech OR cybersécurité",
            ("fr", Category::Science) => "recherche OR découverte OR étude OR expérience OR laboratoire OR scientifique OR publication OR académie OR physique OR chimie OR biologie",
            ("fr", Category::Health) => "médecine OR hôpital OR patient OR maladie OR traitement OR thérapie OR vaccin OR médicament OR chirurgie OR diagnostic OR prévention",
            ("fr", Category::Sports) => "football OR ligue1 OR match OR but OR équipe OR athlète OR championnat OR compétition OR olympiques OR entraînement OR résultat",

            ("de", Category::Politics) => "Regierung OR Parlament OR Bundestag OR Minister OR Wahlen OR Partei OR Koalition OR Mehrheit OR Opposition OR Gesetz OR Verordnung",
            ("de", Category::Economy) => "BIP OR Inflation OR Börse OR Finanzen OR Markt OR Aktien OR Bank OR Investitionen OR Rezession OR Wachstum OR Defizit OR Schulden",
            ("de", Category::Technology) => "künstliche Intelligenz OR KI OR Algorithmus OR Software OR Hardware OR digital OR Startup OR Innovation OR Tech OR Cybersicherheit",
            ("de", Category::Science) => "Forschung OR Entdeckung OR Studie OR Experiment OR Labor OR wissenschaftlich OR Veröffentlichung OR Akademie OR Physik OR Chemie OR Biologie",
            ("de", Category::Health) => "Medizin OR Krankenhaus OR Patient OR Krankheit OR Behandlung OR Therapie OR Impfstoff OR Medikament OR Chirurgie OR Diagnose OR Prävention",
            ("de", Category::Sports) => "Fußball OR Bundesliga OR Spiel OR Tor OR Mannschaft OR Athlet OR Meisterschaft OR Wettbewerb OR Olympia OR Training OR Ergebnis",

            ("es", Category::Politics) => "gobierno OR parlamento OR senado OR ministro OR elecciones OR partido OR coalición OR mayoría OR oposición OR ley OR decreto",
            ("es", Category::Economy) => "pib OR inflación OR bolsa OR finanzas OR mercado OR acciones OR banco OR inversiones OR recesión OR crecimiento OR déficit OR deuda",
            ("es", Category::Technology) => "inteligencia artificial OR IA OR algoritmo OR software OR hardware OR digital OR startup OR innovación OR tecnología OR ciberseguridad",
            ("es", Category::Science) => "investigación OR descubrimiento OR estudio OR experimento OR laboratorio OR científico OR publicación OR academia OR física OR química OR biología",
            ("es", Category::Health) => "medicina OR hospital OR paciente OR enfermedad OR tratamiento OR terapia OR vacuna OR medicamento OR cirugía OR diagnóstico OR prevención",
            ("es", Category::Sports) => "fútbol OR liga OR partido OR gol OR equipo OR atleta OR campeonato OR competición OR olímpicos OR entrenamiento OR resultado",

            (_, Category::Politics) => "government OR parliament OR senate OR minister OR elections OR party OR coalition OR majority OR opposition OR bill OR legislation OR policy",
            (_, Category::Economy) => "gdp OR inflation OR stockmarket OR finance OR market OR stocks OR bank OR investments OR recession OR growth OR deficit OR debt",
            (_, Category::Technology) => "artificial intelligence OR AI OR algorithm OR software OR hardware OR digital OR startup OR innovation OR tech OR cybersecurity OR blockchain",
            (_, Category::Science) => "research OR discovery OR study OR experiment OR laboratory OR scientific OR publication OR academia OR physics OR chemistry OR biology",
            (_, Category::Health) => "medicine OR hospital OR patient OR disease OR treatment OR therapy OR vaccine OR drug OR surgery OR diagnosis OR prevention",
            (_, Category::Sports) => "football OR soccer OR match OR goal OR team OR athlete OR championship OR competition OR olympics OR training OR result",
        }
    }

    fn detection_keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Politics => &["government", "parliament", "election", "minister", "policy", "law", "senate"],
            Category::Economy => &["economy", "market", "stock", "finance", "investment", "gdp", "inflation", "bank"],
            Category::Technology => &["technology", "software", "digital", "ai", "algorithm", "tech", "computer", "cyber"],
            Category::Science => &["science", "research", "study", "experiment", "discovery", "scientific", "laboratory"],
            Category::Health => &["health", "medical", "hospital", "patient", "disease", "treatment", "medicine", "vaccine"],
            Category::Sports => &["sports", "game", "match", "team", "player", "championship", "olympic", "goal"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown category: {}. Use one of: {}",
                    wanted,
                    join_names(Category::ALL.iter().map(|c| c.name()))
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Italy,
    Usa,
    France,
    Germany,
    Spain,
    England,
    World,
}

impl Location {
    pub const ALL: [Location; 7] = [
        Location::Italy,
        Location::Usa,
        Location::France,
        Location::Germany,
        Location::Spain,
        Location::England,
        Location::World,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Location::Italy => "Italy",
            Location::Usa => "USA",
            Location::France => "France",
            Location::Germany => "Germany",
            Location::Spain => "Spain",
            Location::England => "England",
            Location::World => "World",
        }
    }

    pub fn language(&self) -> &'static str {
        match self {
            Location::Italy => "it",
            Location::France => "fr",
            Location::Germany => "de",
            Location::Spain => "es",
            Location::Usa | Location::England | Location::World => "en",
        }
    }

    /// Outlets used when domain restriction is enabled. World news is unrestricted.
    pub fn domains(&self) -> Option<&'static str> {
        match self {
            Location::Italy => Some("ansa.it,repubblica.it,ilsole24ore.com,rainews.it"),
            Location::France => Some("lemonde.fr,lefigaro.fr,liberation.fr,20minutes.fr"),
            Location::Germany => Some("spiegel.de,zeit.de,faz.net,sueddeutsche.de"),
            Location::England => Some("bbc.co.uk,theguardian.com,telegraph.co.uk,dailymail.co.uk"),
            Location::Spain => Some("elpais.com,elmundo.es,abc.es,larazon.es"),
            Location::Usa => Some("cnn.com,nytimes.com,wsj.com,washingtonpost.com"),
            Location::World => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Location {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Location::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown location: {}. Use one of: {}",
                    wanted,
                    join_names(Location::ALL.iter().map(|l| l.name()))
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    LastSevenDays,
}

impl DateRange {
    /// Ranges offered in the interactive interface. "today" needs a paid NewsAPI plan.
    pub const OFFERED: [DateRange; 3] = [DateRange::Yesterday, DateRange::Today, DateRange::ThisWeek];

    pub const ALL: [DateRange; 7] = [
        DateRange::Today,
        DateRange::Yesterday,
        DateRange::ThisWeek,
        DateRange::LastWeek,
        DateRange::ThisMonth,
        DateRange::LastMonth,
        DateRange::LastSevenDays,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Yesterday => "yesterday",
            DateRange::ThisWeek => "this week",
            DateRange::LastWeek => "last week",
            DateRange::ThisMonth => "this month",
            DateRange::LastMonth => "last month",
            DateRange::LastSevenDays => "last 7 days",
        }
    }

    /// Inclusive (from, to) dates for this range, relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let days_since_monday = today.weekday().num_days_from_monday() as i64;
        match self {
            DateRange::Today => (today, today),
            DateRange::Yesterday => {
                let yesterday = today - Duration::days(1);
                (yesterday, yesterday)
            }
            DateRange::ThisWeek => (today - Duration::days(days_since_monday), today),
            DateRange::LastWeek => {
                let monday = today - Duration::days(days_since_monday + 7);
                (monday, monday + Duration::days(6))
            }
            DateRange::ThisMonth => (today.with_day(1).unwrap_or(today), today),
            DateRange::LastMonth => {
                let first_this_month = today.with_day(1).unwrap_or(today);
                let last_prev_month = first_this_month - Duration::days(1);
                (last_prev_month.with_day(1).unwrap_or(last_prev_month), last_prev_month)
            }
            DateRange::LastSevenDays => (today - Duration::days(7), today),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DateRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace(['-', '_'], " ").to_lowercase();
        DateRange::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown date range: {}. Use one of: {}",
                    s.trim(),
                    join_names(DateRange::ALL.iter().map(|r| r.name()))
                )
            })
    }
}

/// Everything needed to issue one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub location: Location,
    pub date_range: DateRange,
    pub categories: Vec<Category>,
}

impl NewsQuery {
    pub fn new(location: Location, date_range: DateRange, mut categories: Vec<Category>) -> Self {
        categories.sort();
        categories.dedup();
        Self {
            location,
            date_range,
            categories,
        }
    }

    pub fn search_terms(&self) -> String {
        build_query(&self.categories, self.location.language())
    }
}

/// Parenthesised keyword groups joined with OR, or `news` when nothing matched.
pub fn build_query(categories: &[Category], language: &str) -> String {
    let parts: Vec<String> = categories
        .iter()
        .map(|c| format!("({})", c.search_terms(language)))
        .collect();

    if parts.is_empty() {
        "news".to_string()
    } else {
        parts.join(" OR ")
    }
}

/// Pick the candidate whose keywords occur most often in `text`.
pub fn detect_category(text: &str, candidates: &[Category]) -> Option<Category> {
    let text_lower = text.to_lowercase();

    let mut best: Option<(Category, usize)> = None;
    for category in candidates {
        let score = category
            .detection_keywords()
            .iter()
            .filter(|kw| text_lower.contains(*kw))
            .count();
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((*category, score));
        }
    }

    match best {
        Some((category, score)) if score > 0 => Some(category),
        _ => candidates.first().copied(),
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
