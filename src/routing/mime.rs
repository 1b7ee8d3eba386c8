//! Accept-header negotiation.
//!
//! # Responsibilities
//! - Parse `Accept`-style headers into weighted media ranges
//! - Pick the best type a candidate can produce
//!
//! # Design Decisions
//! - The most specific header range matching a produced type decides its quality
//! - Highest quality wins; ties go to the first declared produced type
//! - `q=0` means "not acceptable"
//! - Absent header behaves like `*/*`

use std::collections::HashMap;

/// Media range used when the client sent no `Accept` header.
pub const ANY: &str = "*/*";

#[derive(Debug, Clone, PartialEq)]
struct MediaRange {
    kind: String,
    subtype: String,
    params: HashMap<String, String>,
    quality: f32,
}

impl MediaRange {
    fn parse(range: &str) -> Self {
        let mut parts = range.split(';');
        let full_type = parts.next().unwrap_or_default().trim();
        let full_type = if full_type == "*" { ANY } else { full_type };

        let (kind, subtype) = match full_type.split_once('/') {
            Some((kind, subtype)) => (kind.trim(), subtype.trim()),
            None => (full_type, "*"),
        };

        let mut params = HashMap::new();
        let mut quality = 1.0;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            if key == "q" {
                quality = value
                    .parse::<f32>()
                    .ok()
                    .filter(|q| (0.0..=1.0).contains(q))
                    .unwrap_or(1.0);
            } else {
                params.insert(key, value.to_string());
            }
        }

        Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params,
            quality,
        }
    }

    /// Specificity of `self` (a header range) for `target`, or `None` when
    /// the two are incompatible.
    fn fitness_for(&self, target: &MediaRange) -> Option<u32> {
        let kind_ok = self.kind == target.kind || self.kind == "*" || target.kind == "*";
        let subtype_ok =
            self.subtype == target.subtype || self.subtype == "*" || target.subtype == "*";
        if !(kind_ok && subtype_ok) {
            return None;
        }

        let mut fitness = 0;
        if self.kind == target.kind {
            fitness += 100;
        }
        if self.subtype == target.subtype {
            fitness += 10;
        }
        fitness += target
            .params
            .iter()
            .filter(|(k, v)| self.params.get(*k) == Some(*v))
            .count() as u32;
        Some(fitness)
    }
}

fn parse_header(header: &str) -> Vec<MediaRange> {
    header
        .split(',')
        .filter(|r| !r.trim().is_empty())
        .map(MediaRange::parse)
        .collect()
}

/// Quality the header assigns to `produced`, decided by its most specific
/// matching range.
fn quality_of(produced: &str, ranges: &[MediaRange]) -> f32 {
    let target = MediaRange::parse(produced);
    let mut best: Option<(u32, f32)> = None;
    for range in ranges {
        if let Some(fitness) = range.fitness_for(&target) {
            if best.map_or(true, |(f, _)| fitness > f) {
                best = Some((fitness, range.quality));
            }
        }
    }
    best.map_or(0.0, |(_, q)| q)
}

/// Index of the best entry in `supported` for the given header, or `None`
/// when nothing is acceptable.
pub fn best_match_index<S: AsRef<str>>(supported: &[S], header: Option<&str>) -> Option<usize> {
    let header = header.map(str::trim).filter(|h| !h.is_empty()).unwrap_or(ANY);
    let ranges = parse_header(header);

    let mut best: Option<(usize, f32)> = None;
    for (i, produced) in supported.iter().enumerate() {
        let quality = quality_of(produced.as_ref(), &ranges);
        if quality <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, q)| quality > q) {
            best = Some((i, quality));
        }
    }
    best.map(|(i, _)| i)
}

/// Best produced type for the given header.
pub fn best_match<'a, S: AsRef<str>>(supported: &'a [S], header: Option<&str>) -> Option<&'a str> {
    best_match_index(supported, header).map(|i| supported[i].as_ref())
}

/// Whether a single produced type is acceptable at all.
pub fn accepts(produced: &str, header: Option<&str>) -> bool {
    best_match_index(&[produced], header).is_some()
}
