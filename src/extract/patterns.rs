use std::sync::LazyLock;

use regex::Regex;

/// Party acronyms recognised inline; matched longest first.
const KNOWN_SIGLAS: [&str; 15] = [
    "PS", "PPD/PSD", "CDS-PP", "PAN", "BE", "PCP-PEV", "CDU", "IL", "LIVRE", "CHEGA", "NC",
    "MPT", "PTP", "RIR", "JPP",
];

pub(super) struct Patterns {
    organs: Vec<(Regex, &'static str)>,
    organ_heading: Regex,
    new_list: Vec<Regex>,
    section_header: Regex,
    list_name_label: Regex,
    heading_label: Regex,
    dash_split: Regex,
    known_siglas: Vec<(&'static str, Regex)>,
    coalition: Regex,
    proponents: Vec<Regex>,
    trailing_proponent: Regex,
    ordinal: Regex,
    name_separator: Regex,
}

pub(super) static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);

impl Patterns {
    fn new() -> Self {
        let organs = vec![
            (
                Regex::new(r"(?i)\bAssembleia Municipal\b").expect("valid AM regex"),
                "AM",
            ),
            (
                Regex::new(r"(?i)\bC[âa]mara Municipal\b").expect("valid CM regex"),
                "CM",
            ),
            (
                Regex::new(r"(?i)\bAssembleia de Freguesia\b").expect("valid AF regex"),
                "AF",
            ),
        ];

        let organ_heading = Regex::new(
            r"(?i)^\s*(?:\d{1,3}\s*[.)\-]?\s*)?(?:Assembleia Municipal|C[âa]mara Municipal|Assembleia de Freguesia)\b",
        )
        .expect("valid organ heading regex");

        let new_list = [
            r"(?i)^\s*(?:Lista|Candidatura)\b",
            r"(?i)^\s*Denomina[cç][aã]o\b",
            r"(?i)^\s*Nome da lista\b",
            r"(?i)^\s*Designa[cç][aã]o\b",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid list heading regex"))
        .collect();

        let section_header = Regex::new(
            r"(?i)^\s*Candidatos?\s+(?P<kind>efe?c?tivos?|suplentes?)\s*:?\s*$",
        )
        .expect("valid section header regex");

        let list_name_label = Regex::new(
            r"(?i)(?:Denomina[cç][aã]o|Nome da lista|Designa[cç][aã]o)\s*:\s*(?P<name>.+?)\s*$",
        )
        .expect("valid list name label regex");

        let heading_label = Regex::new(
            r"(?i)^\s*(?:Lista|Candidatura|Denomina[cç][aã]o|Nome da lista|Designa[cç][aã]o)\s*:\s*(?P<name>.+?)\s*$",
        )
        .expect("valid heading label regex");

        let dash_split = Regex::new(r"\s+[-–—]\s+").expect("valid dash split regex");

        let mut siglas = KNOWN_SIGLAS.to_vec();
        siglas.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let known_siglas = siglas
            .into_iter()
            .map(|sigla| {
                let regex = Regex::new(&format!(
                    r"(?:^|[^\w/\-.]){}(?:$|[^\w/\-.])",
                    regex::escape(sigla)
                ))
                .expect("valid sigla regex");
                (sigla, regex)
            })
            .collect();

        let coalition = Regex::new(
            r"\b(?P<sigla>[A-Z]{2,}(?:[/\-][A-Z]{2,})?(?:\.[A-Z]{2,}(?:[/\-][A-Z]{2,})?)+)\b",
        )
        .expect("valid coalition regex");

        let proponents = [
            r"(?i:\bpropost[oa]\s+por)\s+(?P<sigla>[A-Z][A-Z/\-]+)\b",
            r"(?i:\bproponente)\s*:\s*(?P<sigla>[A-Z][A-Z/\-]+)\b",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid proponent regex"))
        .collect();

        let trailing_proponent = Regex::new(r"\s[–\-]\s*(?P<sigla>[A-Z][A-Z/\-]+)\s*$")
            .expect("valid trailing proponent regex");

        let ordinal = Regex::new(
            r"^\s*(?P<num>\d{1,3})(?:\s*\.?\s*[º°ª])?(?:\s*[.)\-–]\s*|\s+)(?P<rest>.*)$",
        )
        .expect("valid ordinal regex");

        let name_separator = Regex::new(r"\s+[–\-]\s+|,").expect("valid name separator regex");

        Self {
            organs,
            organ_heading,
            new_list,
            section_header,
            list_name_label,
            heading_label,
            dash_split,
            known_siglas,
            coalition,
            proponents,
            trailing_proponent,
            ordinal,
            name_separator,
        }
    }

    /// Returns the organ code named on the line, if any.
    pub(super) fn detect_orgao(&self, line: &str) -> Option<&'static str> {
        self.organs
            .iter()
            .find(|(pattern, _)| pattern.is_match(line))
            .map(|(_, code)| *code)
    }

    pub(super) fn is_organ_heading(&self, line: &str) -> bool {
        self.organ_heading.is_match(line)
    }

    pub(super) fn is_new_list_heading(&self, line: &str) -> bool {
        self.new_list.iter().any(|pattern| pattern.is_match(line))
    }

    /// `Some("2")` for an effective-candidates header, `Some("3")` for substitutes.
    pub(super) fn section_tipo(&self, line: &str) -> Option<&'static str> {
        let captures = self.section_header.captures(line)?;
        let kind = captures.name("kind")?.as_str().to_lowercase();
        if kind.starts_with("suplente") {
            Some("3")
        } else {
            Some("2")
        }
    }

    /// Finds a coalition (dotted) acronym first, then a known party acronym.
    pub(super) fn find_sigla(&self, text: &str, extra: &str) -> Option<String> {
        if let Some(captures) = self.coalition.captures(text) {
            if let Some(sigla) = captures.name("sigla") {
                return Some(sigla.as_str().to_string());
            }
        }

        if !extra.is_empty() && contains_acronym(text, extra) {
            return Some(extra.to_string());
        }

        self.known_siglas
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(sigla, _)| sigla.to_string())
    }

    /// Value of a `Denominação: ...` style declaration anywhere on the line.
    pub(super) fn find_nome_lista(&self, text: &str) -> Option<String> {
        self.list_name_label
            .captures(text)
            .and_then(|captures| captures.name("name"))
            .map(|name| name.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Extracts the list display name from a heading line.
    pub(super) fn heading_nome_lista(&self, heading: &str, sigla: Option<&str>) -> Option<String> {
        let labelled = self
            .heading_label
            .captures(heading)
            .and_then(|captures| captures.name("name"))
            .map(|name| name.as_str().to_string());

        let body = labelled.as_deref().unwrap_or(heading).trim();
        let name = self.strip_sigla_side(body, sigla);
        let name = name.trim().trim_end_matches([':', ';']).trim().to_string();

        if name.is_empty() || (labelled.is_none() && self.is_bare_keyword(&name)) {
            return None;
        }
        Some(name)
    }

    fn strip_sigla_side(&self, body: &str, sigla: Option<&str>) -> String {
        let Some(split) = self.dash_split.find(body) else {
            return body.to_string();
        };
        let left = body[..split.start()].trim();
        let right = body[split.end()..].trim();

        let Some(sigla) = sigla.filter(|value| !value.is_empty()) else {
            return left.to_string();
        };

        if right == sigla {
            left.to_string()
        } else if left == sigla || contains_acronym(left, sigla) {
            right.to_string()
        } else {
            left.to_string()
        }
    }

    fn is_bare_keyword(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        matches!(
            lowered.as_str(),
            "lista" | "candidatura" | "denominação" | "denominacao" | "nome da lista" | "designação"
                | "designacao"
        )
    }

    /// Labelled hints ("proposto por X", "Proponente: X") are taken as written.
    /// A bare trailing "- X" only counts when X is a known party acronym or a
    /// member of `coalition`, so role words like "SUPLENTE" are ignored.
    pub(super) fn find_proponente(&self, line: &str, coalition: Option<&str>) -> Option<String> {
        let labelled = self.proponents.iter().find_map(|pattern| capture_sigla(pattern, line));
        if labelled.is_some() {
            return labelled;
        }

        capture_sigla(&self.trailing_proponent, line).filter(|sigla| {
            KNOWN_SIGLAS.contains(&sigla.as_str())
                || coalition.is_some_and(|coalition| is_coalition_member(coalition, sigla))
        })
    }

    /// Splits an ordinal candidate line into `(numeral, remainder)`.
    pub(super) fn match_ordinal<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.ordinal.captures(line)?;
        let num = captures.name("num")?.as_str();
        let rest = captures.name("rest").map(|rest| rest.as_str()).unwrap_or("");
        Some((num, rest))
    }

    /// Text before the first ` - ` or `,`, used when no person entity is found.
    #[cfg_attr(not(test), allow(dead_code))]
    pub(super) fn leading_name<'a>(&self, text: &'a str) -> &'a str {
        self.name_separator
            .split(text)
            .next()
            .unwrap_or(text)
            .trim()
    }
}

pub(super) fn is_coalition(sigla: &str) -> bool {
    sigla.contains('.')
}

/// True when `sigla` is one of the components of the coalition acronym `coalition`.
pub(super) fn is_coalition_member(coalition: &str, sigla: &str) -> bool {
    is_coalition(coalition) && coalition.split('.').any(|member| member == sigla)
}

fn capture_sigla(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|captures| captures.name("sigla"))
        .map(|sigla| normalize_proponente(sigla.as_str().trim()))
}

pub(super) fn normalize_proponente(value: &str) -> String {
    value
        .to_uppercase()
        .replace("CDSPP", "CDS-PP")
        .replace("PPDPSD", "PPD/PSD")
}

fn contains_acronym(text: &str, acronym: &str) -> bool {
    text.split(|ch: char| ch.is_whitespace() || matches!(ch, ',' | ';' | ':' | '(' | ')'))
        .any(|token| token == acronym)
}
