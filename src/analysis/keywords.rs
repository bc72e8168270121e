//! Keyword detection over model-generated descriptions

use serde::{Deserialize, Serialize};

use crate::vocabulary::{EmbellishmentKind, COLORS, EMBELLISHMENTS, FABRICS, PATTERNS, STYLES};

/// Embellishment flags found in a description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbellishmentReport {
    pub has_sequins: bool,
    pub has_beading: bool,
    pub has_embroidery: bool,
    pub has_lace: bool,
    pub has_rhinestones: bool,
    pub has_pearls: bool,
    pub has_appliques: bool,
    pub has_ruffles: bool,
    pub has_fringe: bool,
    pub has_studs: bool,
    pub has_feathers: bool,
    pub has_bows: bool,
    /// Canonical embellishment terms, in lexicon order
    pub matched_terms: Vec<String>,
}

impl EmbellishmentReport {
    fn set(&mut self, kind: EmbellishmentKind) {
        let flag = match kind {
            EmbellishmentKind::Sequins => &mut self.has_sequins,
            EmbellishmentKind::Beading => &mut self.has_beading,
            EmbellishmentKind::Embroidery => &mut self.has_embroidery,
            EmbellishmentKind::Lace => &mut self.has_lace,
            EmbellishmentKind::Rhinestones => &mut self.has_rhinestones,
            EmbellishmentKind::Pearls => &mut self.has_pearls,
            EmbellishmentKind::Appliques => &mut self.has_appliques,
            EmbellishmentKind::Ruffles => &mut self.has_ruffles,
            EmbellishmentKind::Fringe => &mut self.has_fringe,
            EmbellishmentKind::Studs => &mut self.has_studs,
            EmbellishmentKind::Feathers => &mut self.has_feathers,
            EmbellishmentKind::Bows => &mut self.has_bows,
        };
        *flag = true;
    }

    /// Add terms reported directly by the model (e.g. an `embellishments`
    /// array), canonicalised through the lexicon
    pub fn absorb_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for label in labels {
            let label = label.as_ref();
            let term = EMBELLISHMENTS
                .canonicalize(label)
                .map(str::to_string)
                .or_else(|| EMBELLISHMENTS.matches(label).into_iter().next());
            if let Some(term) = term {
                self.record(&term);
            }
        }
    }

    fn record(&mut self, term: &str) {
        if let Some(kind) = EmbellishmentKind::from_term(term) {
            self.set(kind);
        }
        if !self.matched_terms.iter().any(|t| t == term) {
            self.matched_terms.push(term.to_string());
        }
    }

    pub fn any(&self) -> bool {
        !self.matched_terms.is_empty()
    }
}

/// Scan `text` for embellishment keywords
pub fn detect_embellishments(text: &str) -> EmbellishmentReport {
    let mut report = EmbellishmentReport::default();
    for term in EMBELLISHMENTS.matches(text) {
        report.record(&term);
    }
    report
}

/// Vocabulary attributes found in free text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMatches {
    pub colors: Vec<String>,
    pub fabrics: Vec<String>,
    pub patterns: Vec<String>,
    pub styles: Vec<String>,
}

impl AttributeMatches {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
            && self.fabrics.is_empty()
            && self.patterns.is_empty()
            && self.styles.is_empty()
    }
}

/// Scan `text` against the color, fabric, pattern and style lexicons
pub fn extract_attributes(text: &str) -> AttributeMatches {
    AttributeMatches {
        colors: COLORS.matches(text),
        fabrics: FABRICS.matches(text),
        patterns: PATTERNS.matches(text),
        styles: STYLES.matches(text),
    }
}

/// Append `extra` to `target`, skipping case-insensitive duplicates
pub fn merge_unique(target: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    for value in extra {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if !target.iter().any(|existing| existing.eq_ignore_ascii_case(value)) {
            target.push(value.to_string());
        }
    }
}
