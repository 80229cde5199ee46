//! Parsing of the VCF meta-information and `#CHROM` header lines.

use enum_map::EnumMap;
use regex::Regex;

use crate::err::ParseError;

/// The kinds of meta-information lines whose IDs are recorded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, enum_map::Enum, strum::Display, strum::EnumString,
)]
pub enum HeaderKind {
    #[strum(serialize = "INFO")]
    Info,
    #[strum(serialize = "FILTER")]
    Filter,
    #[strum(serialize = "FORMAT")]
    Format,
}

/// A parsed `##INFO` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoDescriptor {
    pub id: String,
    pub number: String,
    pub ty: String,
    pub description: String,
}

/// Patterns for the structured meta-information lines.
#[derive(Debug)]
struct Patterns {
    info: Regex,
    filter: Regex,
    format: Regex,
}

impl Patterns {
    fn new() -> Result<Self, anyhow::Error> {
        Ok(Self {
            info: Regex::new(concat!(
                r#"^##INFO=<"#,
                r#"ID=(?P<id>[^,]+),"#,
                r#"Number=(?P<number>-?\d+|\.|[AGR]),"#,
                r#"Type=(?P<type>Integer|Float|Flag|Character|String),"#,
                r#"Description="(?P<desc>[^"]*)""#,
                r#">"#,
            ))?,
            filter: Regex::new(concat!(
                r#"^##FILTER=<"#,
                r#"ID=(?P<id>[^,]+),"#,
                r#"Description="(?P<desc>[^"]*)""#,
                r#">"#,
            ))?,
            format: Regex::new(concat!(
                r#"^##FORMAT=<"#,
                r#"ID=(?P<id>.+),"#,
                r#"Number=(?P<number>-?\d+|\.|[AGR]),"#,
                r#"Type=(?P<type>.+),"#,
                r#"Description="(?P<desc>.*)""#,
                r#">"#,
            ))?,
        })
    }
}

/// Metadata of one VCF file, built while consuming the header.
#[derive(Debug)]
pub struct MetadataParser {
    patterns: Patterns,
    /// Value of `##fileformat`, if seen.
    pub fileformat: Option<String>,
    /// Declared IDs by header line kind, in order of declaration.
    pub ids: EnumMap<HeaderKind, Vec<String>>,
    /// Parsed `##INFO` declarations, in order of declaration.
    pub info: Vec<InfoDescriptor>,
    /// Column names of the VEP annotation in `INFO/CSQ`.
    pub vep_columns: Vec<String>,
    /// Column names from the `#CHROM` line, without the leading `#`.
    pub header: Vec<String>,
}

impl MetadataParser {
    pub fn new() -> Result<Self, anyhow::Error> {
        Ok(Self {
            patterns: Patterns::new()?,
            fileformat: None,
            ids: EnumMap::default(),
            info: Vec::new(),
            vep_columns: Vec::new(),
            header: Vec::new(),
        })
    }

    /// Parse one `##` meta-information line.
    ///
    /// Lines other than `fileformat`, `INFO`, `FILTER`, and `FORMAT` are ignored.
    pub fn read_metadata(&mut self, line: &str) -> Result<(), anyhow::Error> {
        let line = line.trim_end();
        let body = line.strip_prefix("##").unwrap_or(line);
        let (keyword, value) = match body.split_once('=') {
            Some((keyword, value)) => (keyword, Some(value)),
            None => (body, None),
        };

        if keyword == "fileformat" {
            match value {
                Some(value) if !value.is_empty() => self.fileformat = Some(value.to_string()),
                _ => return Err(ParseError::MissingFileFormat.into()),
            }
        } else if let Ok(kind) = keyword.parse::<HeaderKind>() {
            self.read_structured(kind, line)?;
        } else {
            tracing::trace!("skipping header line {}", line);
        }

        Ok(())
    }

    /// Parse a structured `INFO`, `FILTER`, or `FORMAT` line and record its ID.
    fn read_structured(&mut self, kind: HeaderKind, line: &str) -> Result<(), anyhow::Error> {
        let pattern = match kind {
            HeaderKind::Info => &self.patterns.info,
            HeaderKind::Filter => &self.patterns.filter,
            HeaderKind::Format => &self.patterns.format,
        };
        let captures = pattern.captures(line).ok_or_else(|| match kind {
            HeaderKind::Info => ParseError::MalformedInfo(line.to_string()),
            HeaderKind::Filter => ParseError::MalformedFilter(line.to_string()),
            HeaderKind::Format => ParseError::MalformedFormat(line.to_string()),
        })?;
        let id = captures["id"].to_string();

        if kind == HeaderKind::Info {
            let descriptor = InfoDescriptor {
                id: id.clone(),
                number: captures["number"].to_string(),
                ty: captures["type"].to_string(),
                description: captures["desc"].to_string(),
            };
            tracing::trace!(
                "INFO {} with Number={} and Type={}: {}",
                &descriptor.id,
                &descriptor.number,
                &descriptor.ty,
                &descriptor.description
            );
            if descriptor.id == "CSQ" {
                self.vep_columns = vep_columns(&descriptor.description);
                tracing::debug!("VEP columns: {:?}", &self.vep_columns);
            }
            self.info.push(descriptor);
        }
        tracing::trace!("{} header line with ID {}", kind, &id);
        self.ids[kind].push(id);

        Ok(())
    }

    /// Parse the `#CHROM` line.
    pub fn read_header(&mut self, line: &str) -> Result<(), anyhow::Error> {
        let line = line.trim_end();
        self.header = line
            .strip_prefix('#')
            .unwrap_or(line)
            .split('\t')
            .map(String::from)
            .collect();
        if self.header.len() != 10 {
            return Err(ParseError::UnsupportedSampleCount(self.header.len()).into());
        }
        Ok(())
    }

    /// Name of the single sample, available after the `#CHROM` line has been read.
    pub fn sample(&self) -> Option<&str> {
        self.header.get(9).map(|s| s.as_str())
    }
}

/// Extract the VEP column names from the `CSQ` description.
///
/// The columns follow the last `Format:` marker and are separated by `|`.
fn vep_columns(description: &str) -> Vec<String> {
    description
        .rsplit("Format:")
        .next()
        .unwrap_or_default()
        .trim()
        .split('|')
        .map(String::from)
        .collect()
}
