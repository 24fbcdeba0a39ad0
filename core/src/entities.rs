use crate::capability::{recognizer_probes, resolve, Capability, EntityRecognizer};
use crate::config::AnalysisConfig;
use crate::{Entities, EntityKind};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(concat!(
        r"(?i)\b\d{1,2}[./-]\d{1,2}[./-]\d{2,4}\b",
        r"|\b\d{4}-\d{2}-\d{2}\b",
        r"|\b\d{1,2}\s+(?:січня|лютого|березня|квітня|травня|червня|липня|серпня|вересня|жовтня|листопада|грудня)\s+\d{4}\b",
    ))
    .expect("valid regex");
    // 1 to 4 capitalized words separated by whitespace
    static ref CAP_SEQ: Regex =
        Regex::new(r"\b\p{Lu}[\p{Ll}'’\-]+(?:\s+\p{Lu}[\p{Ll}'’\-]+){0,3}").expect("valid regex");
}

/// Map a recognizer-native label onto an entity category.
pub fn category_for_label(label: &str) -> Option<EntityKind> {
    match label.trim().to_uppercase().as_str() {
        "PERSON" | "PER" => Some(EntityKind::Per),
        "ORG" => Some(EntityKind::Org),
        "GPE" | "LOC" => Some(EntityKind::Loc),
        "DATE" | "TIME" => Some(EntityKind::Date),
        _ => None,
    }
}

pub struct EntityExtractor {
    recognizer: Capability<dyn EntityRecognizer>,
    org_markers: Vec<String>,
}

impl EntityExtractor {
    pub fn new(recognizer: Capability<dyn EntityRecognizer>, org_markers: Vec<String>) -> Self {
        let org_markers = org_markers.into_iter().map(|m| m.to_lowercase()).collect();
        Self { recognizer, org_markers }
    }

    pub fn from_config(cfg: &AnalysisConfig) -> Self {
        let recognizer = resolve("entity_recognizer", recognizer_probes(cfg.entity_gazetteer.as_deref()));
        Self::new(recognizer, cfg.org_markers.clone())
    }

    pub fn has_recognizer(&self) -> bool { self.recognizer.is_present() }

    /// Dates always come from the date patterns. People, organizations and
    /// places come from the recognizer when one is resolved, otherwise from the
    /// capitalized-span heuristic.
    pub fn extract(&self, text: &str) -> Entities {
        let mut ents = Entities::new();
        if text.trim().is_empty() { return ents; }

        for m in DATE_RE.find_iter(text) {
            ents.add(EntityKind::Date, m.as_str());
        }

        match self.recognizer.get() {
            Some(recognizer) => match recognizer.recognize(text) {
                Ok(spans) => {
                    for span in spans {
                        if let Some(kind) = category_for_label(&span.label) {
                            ents.add(kind, &span.text);
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(recognizer = recognizer.name(), error = %err, "entity recognizer failed, keeping dates only");
                }
            },
            None => self.extract_capitalized(text, &mut ents),
        }
        ents
    }

    fn extract_capitalized(&self, text: &str, ents: &mut Entities) {
        for m in CAP_SEQ.find_iter(text) {
            let span = m.as_str().trim();
            let low = span.to_lowercase();
            let kind = if self.org_markers.iter().any(|marker| low.contains(marker.as_str())) {
                EntityKind::Org
            } else if span.split_whitespace().count() >= 2 {
                EntityKind::Per
            } else {
                EntityKind::Loc
            };
            ents.add(kind, span);
        }
    }
}

impl Default for EntityExtractor {
    fn default() -> Self { Self::from_config(&AnalysisConfig::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{EntitySpan, GazetteerEntry, GazetteerRecognizer};
    use anyhow::{anyhow, Result};
    use std::sync::Arc;

    struct Broken;

    impl EntityRecognizer for Broken {
        fn name(&self) -> &str { "broken" }
        fn recognize(&self, _text: &str) -> Result<Vec<EntitySpan>> { Err(anyhow!("model crashed")) }
    }

    #[test]
    fn finds_all_date_shapes() {
        let e = EntityExtractor::default();
        let ents = e.extract("Угоду підписали 1 липня 2024 року, оновили 02.03.2024 та 2024-05-01.");
        assert_eq!(ents.date, vec!["1 липня 2024", "02.03.2024", "2024-05-01"]);

        let ents = e.extract("Звіт від 5/6/2023, чернетка 7.8.24.");
        assert_eq!(ents.date, vec!["5/6/2023", "7.8.24"]);
    }

    #[test]
    fn month_names_match_case_insensitively() {
        let e = EntityExtractor::default();
        let ents = e.extract("12 ГРУДНЯ 2023");
        assert_eq!(ents.date, vec!["12 ГРУДНЯ 2023"]);
    }

    #[test]
    fn heuristic_classifies_capitalized_spans() {
        let e = EntityExtractor::default();
        let ents = e.extract("Іван Петренко працює в Київ Телеком у місті Київ. Іван Петренко");
        assert_eq!(ents.per, vec!["Іван Петренко"]);
        assert_eq!(ents.org, vec!["Київ Телеком"]);
        assert_eq!(ents.loc, vec!["Київ"]);
    }

    #[test]
    fn english_markers_mark_organizations() {
        let e = EntityExtractor::default();
        let ents = e.extract("talks with Ukraine at Kyiv University");
        assert_eq!(ents.loc, vec!["Ukraine"]);
        assert_eq!(ents.org, vec!["Kyiv University"]);
    }

    #[test]
    fn empty_text_has_all_categories_empty() {
        let ents = EntityExtractor::default().extract("   ");
        assert!(ents.is_empty());
    }

    #[test]
    fn recognizer_path_maps_labels_and_skips_heuristic() {
        let g = GazetteerRecognizer::new(
            "test",
            vec![
                GazetteerEntry { text: "Ольга".into(), label: "PERSON".into() },
                GazetteerEntry { text: "Одеса".into(), label: "GPE".into() },
                GazetteerEntry { text: "вчора".into(), label: "TIME".into() },
                GazetteerEntry { text: "Щось".into(), label: "MISC".into() },
            ],
        );
        let e = EntityExtractor::new(Capability::Present(Arc::new(g)), vec![]);
        let ents = e.extract("Ольга вчора була в Одеса Центр 2024-01-02 Щось");
        assert_eq!(ents.per, vec!["Ольга"]);
        assert_eq!(ents.loc, vec!["Одеса"]);
        assert_eq!(ents.date, vec!["2024-01-02", "вчора"]);
        assert!(ents.org.is_empty());
    }

    #[test]
    fn recognizer_failure_keeps_dates_only() {
        let e = EntityExtractor::new(Capability::Present(Arc::new(Broken)), vec![]);
        let ents = e.extract("Іван Петренко, 2024-05-01");
        assert_eq!(ents.date, vec!["2024-05-01"]);
        assert!(ents.per.is_empty() && ents.org.is_empty() && ents.loc.is_empty());
    }
}
