//! Lenient parser for Swiss statute and court-decision citations.
//!
//! Recognized forms:
//!
//! | Form | Example |
//! |---|---|
//! | statute article | `Art. 20 OR`, `Art. 97 Abs. 1 OR`, `art. 41 al. 2 CO`, `Art. 6a ZGB` |
//! | published decision | `BGE 123 III 292`, `ATF 140 III 86 consid. 2.1`, `DTF 135 II 1` |
//! | docket number | `4A_123/2020`, `6B_1/2021 E. 3` |
//!
//! In strict mode the citation must also follow the conventions of the
//! query's language: the decision collection (`BGE`/`ATF`/`DTF`), the
//! paragraph marker (`Abs.`/`al.`/`cpv.`) and the code abbreviation.

use regex::Regex;
use std::sync::LazyLock;
use tribunal_domain::{
    CitationKind, CitationParseError, CitationParser, LanguageTag, StructuredCitation,
};

static STATUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?i:art\.|artikel|article|articolo)\s*(\d+[a-z]?(?:\s?(?:bis|ter|quater|quinquies|sexies))?)(?:\s+(Abs\.|al\.|cpv\.|para\.)\s*(\d+[a-z]?))?(?:\s+(?:lit\.|let\.|Ziff\.|ch\.|n\.)\s*[0-9a-z]+)?\s+([A-Z][A-Za-z]{0,9}\.?)$",
    )
    .expect("STATUTE_RE regex should compile")
});

static DECISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(BGE|ATF|DTF)\s+(\d{1,3})\s+(Ia|Ib|IV|V|I{1,3})\s+(\d{1,4})(?:\s+(?:E\.|consid\.)\s*(\d+(?:\.\d+)*))?$",
    )
    .expect("DECISION_RE regex should compile")
});

static DOCKET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d[A-Z]?_\d{1,5}/\d{4})(?:\s+(?:E\.|consid\.)\s*(\d+(?:\.\d+)*))?$")
        .expect("DOCKET_RE regex should compile")
});

/// Code abbreviations as published in each official language
fn codes(language: LanguageTag) -> &'static [&'static str] {
    match language {
        LanguageTag::De => &[
            "OR", "ZGB", "StGB", "SchKG", "BV", "ZPO", "StPO", "VVG", "DSG", "ArG", "IPRG",
        ],
        LanguageTag::Fr => &[
            "CO", "CC", "CP", "LP", "Cst.", "CPC", "CPP", "LCA", "LPD", "LTr", "LDIP",
        ],
        LanguageTag::It => &[
            "CO", "CC", "CP", "LEF", "Cost.", "CPC", "CPP", "LCA", "LPD", "LL", "LDIP",
        ],
    }
}

fn collection(language: LanguageTag) -> &'static str {
    match language {
        LanguageTag::De => "BGE",
        LanguageTag::Fr => "ATF",
        LanguageTag::It => "DTF",
    }
}

fn paragraph_marker(language: LanguageTag) -> &'static str {
    match language {
        LanguageTag::De => "Abs.",
        LanguageTag::Fr => "al.",
        LanguageTag::It => "cpv.",
    }
}

/// Default [`CitationParser`] for Swiss federal law
#[derive(Debug, Clone, Default)]
pub struct SwissCitationParser {
    strict_language: bool,
}

impl SwissCitationParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject citations that follow another language's conventions
    pub fn strict() -> Self {
        Self {
            strict_language: true,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict_language
    }

    fn parse_statute(reference: &str) -> Option<(StructuredCitation, Option<&str>)> {
        let caps = STATUTE_RE.captures(reference)?;
        let citation = StructuredCitation {
            kind: CitationKind::Statute,
            reference: reference.to_string(),
            article: caps.get(1).map(|m| m.as_str().replace(' ', "")),
            paragraph: caps.get(3).map(|m| m.as_str().to_string()),
            code: caps.get(4).map(|m| m.as_str().to_string()),
        };
        let marker = caps.get(2).map(|m| m.as_str());
        Some((citation, marker))
    }

    fn parse_decision(reference: &str) -> Option<StructuredCitation> {
        if let Some(caps) = DECISION_RE.captures(reference) {
            return Some(StructuredCitation {
                kind: CitationKind::CourtDecision,
                reference: reference.to_string(),
                article: caps.get(4).map(|m| m.as_str().to_string()),
                paragraph: caps.get(5).map(|m| m.as_str().to_string()),
                code: caps.get(1).map(|m| m.as_str().to_string()),
            });
        }

        let caps = DOCKET_RE.captures(reference)?;
        Some(StructuredCitation {
            kind: CitationKind::CourtDecision,
            reference: reference.to_string(),
            article: caps.get(1).map(|m| m.as_str().to_string()),
            paragraph: caps.get(2).map(|m| m.as_str().to_string()),
            code: None,
        })
    }

    fn follows_conventions(
        citation: &StructuredCitation,
        marker: Option<&str>,
        language: LanguageTag,
    ) -> bool {
        match citation.kind {
            CitationKind::CourtDecision => match citation.code.as_deref() {
                Some(code) => code == collection(language),
                // Docket numbers are language-neutral
                None => true,
            },
            CitationKind::Statute => {
                if let Some(marker) = marker
                    && marker != "para."
                    && marker != paragraph_marker(language)
                {
                    return false;
                }
                // Codes unknown to every language are tolerated
                match citation.code.as_deref() {
                    Some(code) => {
                        codes(language).contains(&code)
                            || !LanguageTag::ALL.iter().any(|l| codes(*l).contains(&code))
                    }
                    None => true,
                }
            }
        }
    }
}

impl CitationParser for SwissCitationParser {
    fn parse(
        &self,
        citation: &str,
        language: LanguageTag,
    ) -> Result<StructuredCitation, CitationParseError> {
        let reference = citation.split_whitespace().collect::<Vec<_>>().join(" ");
        if reference.is_empty() {
            return Err(CitationParseError::Empty);
        }

        let (parsed, marker) = match Self::parse_statute(&reference) {
            Some((parsed, marker)) => (parsed, marker.map(str::to_string)),
            None => match Self::parse_decision(&reference) {
                Some(parsed) => (parsed, None),
                None => return Err(CitationParseError::Unrecognized(citation.to_string())),
            },
        };

        if self.strict_language && !Self::follows_conventions(&parsed, marker.as_deref(), language)
        {
            return Err(CitationParseError::LanguageMismatch {
                citation: reference,
                language,
            });
        }

        Ok(parsed)
    }
}
