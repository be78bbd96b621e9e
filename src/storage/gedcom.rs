//! Line-oriented interchange format for individuals and family units.
//!
//! Each line is `<level> <tag> [value]`. Entities start at level 0 with
//! `0 <id> INDI` or `0 <id> FAM`; their fields follow at level 1, and the
//! compound birth and residence fields carry their value on a level 2 line.
//!
//! Decoding never fails. Damaged lines are skipped and listed in a
//! [`DecodeReport`]; unknown tags are ignored.
//!
//! A value can never span lines, so the encoder writes line breaks inside
//! free text as single spaces.

use std::{
    borrow::Cow,
    fmt::Write as _,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::domain::{Config, FamilyUnit, Individual, Sex, Xref};

/// The source and format version written to the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Name of the system that produced the file (`1 SOUR`).
    pub source: String,
    /// Format version (`2 VERS`).
    pub version: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            source: "FamilyTreeApp".to_string(),
            version: "5.5".to_string(),
        }
    }
}

impl From<&Config> for Header {
    fn from(config: &Config) -> Self {
        Self {
            source: config.source_name.clone(),
            version: config.gedcom_version.clone(),
        }
    }
}

/// Why a line was skipped during decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// The level token is not a number.
    #[error("level is not a number: {0:?}")]
    BadLevel(String),

    /// The line has a level but no tag.
    #[error("missing tag")]
    MissingTag,
}

/// A line skipped during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// One-based line number.
    pub number: usize,
    /// Why the line was skipped.
    pub reason: LineError,
}

/// Lines that could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Skipped lines, in file order.
    pub skipped: Vec<SkippedLine>,
}

impl DecodeReport {
    /// Whether every line was decoded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// The output of [`decode_with_report`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Individuals, in file order.
    pub individuals: Vec<Individual>,
    /// Family units, in file order.
    pub families: Vec<FamilyUnit>,
    /// Lines that were skipped.
    pub report: DecodeReport,
}

/// An error reading or writing an interchange file.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The file could not be written.
    #[error("failed to write {path}")]
    Write {
        /// The file that was written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Decodes individuals and family units from interchange text.
///
/// Links are taken verbatim from the `FAMS`, `FAMC`, `HUSB`, `WIFE` and
/// `CHIL` lines; nothing is re-derived.
#[must_use]
pub fn decode(text: &str) -> (Vec<Individual>, Vec<FamilyUnit>) {
    let decoded = decode_with_report(text);
    (decoded.individuals, decoded.families)
}

/// Decodes interchange text, also reporting which lines were skipped.
#[must_use]
pub fn decode_with_report(text: &str) -> Decoded {
    let mut decoder = Decoder::default();
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (index, raw) in text.lines().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match Line::parse(raw) {
            Ok(line) => decoder.accept(&line),
            Err(reason) => {
                let number = index + 1;
                tracing::debug!(line = number, %reason, "skipping malformed line");
                decoder.output.report.skipped.push(SkippedLine { number, reason });
            }
        }
    }

    decoder.finish()
}

/// Reads and decodes an interchange file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_file(path: &Path) -> Result<Decoded, CodecError> {
    let text = fs::read_to_string(path).map_err(|source| CodecError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = decode_with_report(&text);
    if !decoded.report.is_clean() {
        tracing::warn!(
            path = %path.display(),
            skipped = decoded.report.skipped.len(),
            "some lines could not be decoded"
        );
    }
    Ok(decoded)
}

/// Encodes individuals and family units with the default header.
#[must_use]
pub fn encode(individuals: &[Individual], families: &[FamilyUnit]) -> String {
    encode_with_header(&Header::default(), individuals, families)
}

/// Encodes individuals and family units in the order given, individuals
/// first. Empty fields are omitted.
#[must_use]
pub fn encode_with_header(
    header: &Header,
    individuals: &[Individual],
    families: &[FamilyUnit],
) -> String {
    let mut out = String::new();
    write_document(&mut out, header, individuals, families)
        .expect("writing to a String never fails");
    out
}

/// Encodes individuals and family units into a writer.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write<W: Write>(
    writer: &mut W,
    header: &Header,
    individuals: &[Individual],
    families: &[FamilyUnit],
) -> io::Result<()> {
    writer.write_all(encode_with_header(header, individuals, families).as_bytes())
}

/// Encodes individuals and family units into a file, replacing it.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_file(
    path: &Path,
    header: &Header,
    individuals: &[Individual],
    families: &[FamilyUnit],
) -> Result<(), CodecError> {
    let to_error = |source| CodecError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::create(path).map_err(to_error)?;
    let mut writer = io::BufWriter::new(file);
    write(&mut writer, header, individuals, families).map_err(to_error)?;
    writer.flush().map_err(to_error)
}

struct Line<'a> {
    level: u8,
    tag: &'a str,
    value: &'a str,
}

impl<'a> Line<'a> {
    fn parse(line: &'a str) -> Result<Self, LineError> {
        let (level, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let level = level
            .parse()
            .map_err(|_| LineError::BadLevel(level.to_string()))?;

        let rest = rest.trim_start();
        let (tag, value) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(tag, value)| (tag, value.trim_start()));
        if tag.is_empty() {
            return Err(LineError::MissingTag);
        }

        Ok(Self { level, tag, value })
    }

    /// The id and kind of a level 0 entity line.
    fn entity_start(&self) -> Option<(Xref, Kind)> {
        if self.level != 0 {
            return None;
        }
        let kind = match self.value.split_whitespace().next()? {
            "INDI" => Kind::Person,
            "FAM" => Kind::Family,
            _ => return None,
        };
        Xref::new(self.tag.to_string()).ok().map(|id| (id, kind))
    }
}

enum Kind {
    Person,
    Family,
}

enum Entity {
    Person(Individual),
    Family(FamilyUnit),
}

/// A compound field waiting for its level 2 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    BirthDate,
    ResidencePlace,
}

#[derive(Default)]
struct Decoder {
    output: Decoded,
    current: Option<Entity>,
    pending: Option<Pending>,
}

impl Decoder {
    fn accept(&mut self, line: &Line<'_>) {
        if line.level <= 1 {
            self.pending = None;
        }

        if line.level == 0 {
            self.flush();
            self.current = line.entity_start().map(|(id, kind)| match kind {
                Kind::Person => Entity::Person(Individual::new(id)),
                Kind::Family => Entity::Family(FamilyUnit::new(id)),
            });
            return;
        }

        match &mut self.current {
            Some(Entity::Person(individual)) => {
                self.pending = person_field(individual, self.pending, line);
            }
            Some(Entity::Family(family)) => family_field(family, line),
            None => {}
        }
    }

    fn flush(&mut self) {
        match self.current.take() {
            Some(Entity::Person(individual)) => self.output.individuals.push(individual),
            Some(Entity::Family(family)) => self.output.families.push(family),
            None => {}
        }
    }

    fn finish(mut self) -> Decoded {
        self.flush();
        self.output
    }
}

/// Applies a line to an individual, returning the new pending state.
fn person_field(individual: &mut Individual, pending: Option<Pending>, line: &Line<'_>) -> Option<Pending> {
    match (line.level, line.tag, pending) {
        (1, "NAME", _) => individual.name = line.value.replace('/', "").trim().to_string(),
        (1, "SEX", _) => individual.sex = non_empty(line.value).map(Sex::from),
        (1, "BIRT", _) => return Some(Pending::BirthDate),
        (1, "RESI", _) => return Some(Pending::ResidencePlace),
        (1, "OCCU", _) => individual.occupation = non_empty(line.value).map(str::to_string),
        (1, "FAMS", _) => individual.spousal_links.extend(link(line)),
        (1, "FAMC", _) => individual.child_links.extend(link(line)),
        (2, "DATE", Some(Pending::BirthDate)) => {
            individual.birth_date = non_empty(line.value).map(str::to_string);
            return None;
        }
        (2, "PLAC", Some(Pending::ResidencePlace)) => {
            individual.residence = non_empty(line.value).map(str::to_string);
            return None;
        }
        _ => {}
    }
    pending
}

fn family_field(family: &mut FamilyUnit, line: &Line<'_>) {
    match (line.level, line.tag) {
        (1, "HUSB") => family.husband = link(line),
        (1, "WIFE") => family.wife = link(line),
        (1, "CHIL") => family.children.extend(link(line)),
        _ => {}
    }
}

fn link(line: &Line<'_>) -> Option<Xref> {
    let value = non_empty(line.value)?;
    Xref::new(value.to_string())
        .inspect_err(|e| tracing::debug!(tag = line.tag, "ignoring reference: {e}"))
        .ok()
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

/// `John Doe` is written as `John /Doe/`. Single words are written as-is.
fn delimited_name(name: &str) -> String {
    name.rsplit_once(' ').map_or_else(
        || name.to_string(),
        |(given, surname)| format!("{given} /{surname}/"),
    )
}

fn single_line(value: &str) -> Cow<'_, str> {
    if value.contains(['\r', '\n']) {
        Cow::Owned(value.replace("\r\n", " ").replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn write_document(
    out: &mut String,
    header: &Header,
    individuals: &[Individual],
    families: &[FamilyUnit],
) -> std::fmt::Result {
    writeln!(out, "0 HEAD")?;
    writeln!(out, "1 SOUR {}", single_line(&header.source))?;
    writeln!(out, "1 GEDC")?;
    writeln!(out, "2 VERS {}", single_line(&header.version))?;

    for individual in individuals {
        writeln!(out, "0 {} INDI", individual.id)?;
        if !individual.name.is_empty() {
            writeln!(out, "1 NAME {}", delimited_name(&single_line(&individual.name)))?;
        }
        if let Some(sex) = individual.sex.as_ref().map(Sex::as_str).and_then(non_empty) {
            writeln!(out, "1 SEX {}", single_line(sex))?;
        }
        if let Some(date) = individual.birth_date.as_deref().and_then(non_empty) {
            writeln!(out, "1 BIRT\n2 DATE {}", single_line(date))?;
        }
        if let Some(place) = individual.residence.as_deref().and_then(non_empty) {
            writeln!(out, "1 RESI\n2 PLAC {}", single_line(place))?;
        }
        if let Some(occupation) = individual.occupation.as_deref().and_then(non_empty) {
            writeln!(out, "1 OCCU {}", single_line(occupation))?;
        }
        for link in &individual.spousal_links {
            writeln!(out, "1 FAMS {link}")?;
        }
        for link in &individual.child_links {
            writeln!(out, "1 FAMC {link}")?;
        }
    }

    for family in families {
        writeln!(out, "0 {} FAM", family.id)?;
        if let Some(husband) = &family.husband {
            writeln!(out, "1 HUSB {husband}")?;
        }
        if let Some(wife) = &family.wife {
            writeln!(out, "1 WIFE {wife}")?;
        }
        for child in &family.children {
            writeln!(out, "1 CHIL {child}")?;
        }
    }

    writeln!(out, "0 TRLR")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xref(s: &str) -> Xref {
        s.parse().unwrap()
    }

    const SCENARIO: &str = "0 @I1@ INDI\n1 NAME John /Doe/\n1 SEX M\n0 @I2@ INDI\n1 NAME Jane \
                            /Doe/\n1 SEX F\n0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n0 TRLR";

    const FULL: &str = "\
0 HEAD
1 SOUR Elsewhere
1 GEDC
2 VERS 5.5.1
0 @I1@ INDI
1 NAME John /Doe/
1 SEX M
1 BIRT
2 DATE 1 JAN 1900
1 RESI
2 PLAC Springfield
1 OCCU Farmer
1 FAMS @F1@
0 @I2@ INDI
1 NAME Jane /Doe/
1 SEX F
1 FAMS @F1@
0 @I3@ INDI
1 NAME Jim /Doe/
1 SEX X
1 FAMC @F1@
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
0 TRLR
";

    #[test]
    fn decodes_scenario() {
        let (individuals, families) = decode(SCENARIO);

        assert_eq!(individuals.len(), 2);
        assert_eq!(individuals[0].id, xref("@I1@"));
        assert_eq!(individuals[0].name, "John Doe");
        assert_eq!(individuals[0].sex, Some(Sex::Male));
        assert_eq!(individuals[1].name, "Jane Doe");
        assert_eq!(individuals[1].sex, Some(Sex::Female));

        assert_eq!(families.len(), 1);
        assert_eq!(families[0].husband, Some(xref("@I1@")));
        assert_eq!(families[0].wife, Some(xref("@I2@")));
        assert!(families[0].children.is_empty());

        // Links are not derived from family units.
        assert!(individuals[0].spousal_links.is_empty());
    }

    #[test]
    fn decodes_every_recognised_field() {
        let (individuals, families) = decode(FULL);

        let john = &individuals[0];
        assert_eq!(john.birth_date.as_deref(), Some("1 JAN 1900"));
        assert_eq!(john.residence.as_deref(), Some("Springfield"));
        assert_eq!(john.occupation.as_deref(), Some("Farmer"));
        assert_eq!(john.spousal_links, vec![xref("@F1@")]);

        let jim = &individuals[2];
        assert_eq!(jim.sex, Some(Sex::Other("X".to_string())));
        assert_eq!(jim.child_links, vec![xref("@F1@")]);
        assert_eq!(families[0].children, vec![xref("@I3@")]);
    }

    #[test]
    fn last_entity_is_flushed_without_trailer() {
        let (individuals, families) = decode("0 @I1@ INDI\n1 NAME Solo\n0 @F1@ FAM\n1 HUSB @I1@");
        assert_eq!(individuals.len(), 1);
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].husband, Some(xref("@I1@")));
    }

    #[test]
    fn round_trip_preserves_records() {
        let (individuals, families) = decode(FULL);
        let header = Header {
            source: "Elsewhere".to_string(),
            version: "5.5.1".to_string(),
        };

        let encoded = encode_with_header(&header, &individuals, &families);
        assert_eq!(encoded, FULL);
        assert_eq!(decode(&encoded), (individuals, families));
    }

    #[test]
    fn encode_omits_empty_fields() {
        let mut bare = Individual::new(xref("@I1@"));
        bare.occupation = Some(String::new());
        let mut family = FamilyUnit::new(xref("@F1@"));
        family.wife = Some(xref("@I1@"));

        let encoded = encode(&[bare], &[family]);
        assert_eq!(
            encoded,
            "0 HEAD\n1 SOUR FamilyTreeApp\n1 GEDC\n2 VERS 5.5\n0 @I1@ INDI\n0 @F1@ FAM\n1 WIFE \
             @I1@\n0 TRLR\n"
        );
    }

    #[test]
    fn single_word_names_are_not_delimited() {
        let mut individual = Individual::new(xref("@I1@"));
        individual.name = "Madonna".to_string();
        let encoded = encode(&[individual], &[]);
        assert!(encoded.contains("1 NAME Madonna\n"));
    }

    #[test]
    fn malformed_line_is_skipped() {
        let damaged = SCENARIO.replace("1 SEX M", "garbage here");
        let decoded = decode_with_report(&damaged);

        assert_eq!(decoded.individuals.len(), 2);
        assert_eq!(decoded.families.len(), 1);
        assert_eq!(decoded.individuals[0].sex, None);
        assert_eq!(decoded.individuals[0].name, "John Doe");
        assert_eq!(
            decoded.report.skipped,
            vec![SkippedLine {
                number: 3,
                reason: LineError::BadLevel("garbage".to_string()),
            }]
        );
    }

    #[test]
    fn line_without_tag_is_skipped() {
        let decoded = decode_with_report("0 @I1@ INDI\n1\n1 NAME Solo\n0 TRLR");
        assert_eq!(decoded.individuals[0].name, "Solo");
        assert_eq!(decoded.report.skipped[0].reason, LineError::MissingTag);
        assert_eq!(decoded.report.skipped[0].number, 2);
    }

    #[test]
    fn accepts_crlf_blank_lines_and_bom() {
        let text = format!("\u{feff}{}\r\n\r\n", SCENARIO.replace('\n', "\r\n"));
        let decoded = decode_with_report(&text);
        assert!(decoded.report.is_clean());
        assert_eq!(decoded.individuals[1].name, "Jane Doe");
        assert_eq!(decoded.families[0].wife, Some(xref("@I2@")));
    }

    #[test]
    fn pending_state_is_cleared_by_unrelated_event() {
        let (individuals, _) = decode(
            "0 @I1@ INDI\n1 BIRT\n1 DEAT\n2 DATE 1 JAN 1990\n1 RESI\n2 DATE 5 MAY 1950\n2 PLAC \
             Shelbyville\n2 PLAC Ogdenville\n0 TRLR",
        );
        assert_eq!(individuals[0].birth_date, None);
        assert_eq!(individuals[0].residence.as_deref(), Some("Shelbyville"));
    }

    #[test]
    fn lines_outside_entities_are_ignored() {
        let decoded = decode_with_report(
            "0 HEAD\n1 NAME Header\n1 SOUR X\n0 @I1@ INDI\n1 NAME One\n0 @N1@ NOTE\n1 NAME \
             Noted\n0 TRLR",
        );
        assert!(decoded.report.is_clean());
        assert_eq!(decoded.individuals.len(), 1);
        assert_eq!(decoded.individuals[0].name, "One");
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let (individuals, families) =
            decode("0 @I1@ INDI\n1 NAME A /B/\n1 _CUSTOM x\n0 @F1@ FAM\n1 MARR\n2 DATE 1900\n0 TRLR");
        assert_eq!(individuals[0].name, "A B");
        assert_eq!(families[0], FamilyUnit::new(xref("@F1@")));
    }

    #[test]
    fn ids_without_pointer_delimiters_round_trip() {
        let mut individual = Individual::new(xref("person-42"));
        individual.name = "Ada Byron".to_string();
        let mut family = FamilyUnit::new(xref("household-1"));
        family.wife = Some(xref("person-42"));

        let encoded = encode(&[individual.clone()], &[family.clone()]);
        assert!(encoded.contains("0 person-42 INDI\n"));
        assert_eq!(decode(&encoded), (vec![individual], vec![family]));
    }

    #[test]
    fn line_breaks_in_values_cannot_start_records() {
        let mut individual = Individual::new(xref("@I1@"));
        individual.name = "John\nDoe".to_string();
        individual.occupation = Some("Smith\n0 @I9@ INDI\n1 NAME Ghost".to_string());
        individual.residence = Some("Spring\r\nfield".to_string());

        let encoded = encode(&[individual], &[]);
        assert!(encoded.contains("1 NAME John /Doe/\n"));

        let (individuals, families) = decode(&encoded);
        assert_eq!(individuals.len(), 1);
        assert!(families.is_empty());
        assert_eq!(
            individuals[0].occupation.as_deref(),
            Some("Smith 0 @I9@ INDI 1 NAME Ghost")
        );
        assert_eq!(individuals[0].residence.as_deref(), Some("Spring field"));
    }

    #[test]
    fn file_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("family_tree.ged");
        let (individuals, families) = decode(SCENARIO);

        write_file(&path, &Header::default(), &individuals, &families).unwrap();
        let decoded = read_file(&path).unwrap();

        assert_eq!(decoded.individuals, individuals);
        assert_eq!(decoded.families, families);
    }

    #[test]
    fn reading_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let error = read_file(&tmp.path().join("missing.ged")).unwrap_err();
        assert!(matches!(error, CodecError::Read { .. }));
    }
}
