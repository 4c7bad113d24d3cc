//! xmeml (FCP7 XML interchange) sequence serialization.
//!
//! Each kept segment becomes one clip reference at its original source
//! timecode, spliced onto a continuous output track with no transitions.
//! The document carries no timestamps, random IDs, or locale-dependent
//! formatting, so identical inputs serialize byte-identically.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use vtrim_models::SpeechSegment;

/// Pixel aspect ratio of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PixelAspectRatio {
    /// Square pixels
    #[default]
    Square,
    /// NTSC 601 non-square pixels
    Ntsc601,
    /// Anamorphic widescreen
    Anamorphic,
}

impl PixelAspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixelAspectRatio::Square => "square",
            PixelAspectRatio::Ntsc601 => "NTSC-601",
            PixelAspectRatio::Anamorphic => "anamorphic",
        }
    }
}

/// Field dominance of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrder {
    /// Progressive material
    #[default]
    None,
    /// Upper field first
    Upper,
    /// Lower field first
    Lower,
}

impl FieldOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOrder::None => "none",
            FieldOrder::Upper => "upper",
            FieldOrder::Lower => "lower",
        }
    }
}

/// User-tunable export settings, without the source file binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportSettings {
    /// Timeline frame rate
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Frame width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Frame height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Pixel aspect ratio
    #[serde(default)]
    pub pixel_aspect_ratio: PixelAspectRatio,
    /// Field dominance
    #[serde(default)]
    pub fields: FieldOrder,
}

fn default_frame_rate() -> u32 {
    60
}

fn default_width() -> u32 {
    2560
}

fn default_height() -> u32 {
    1440
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            width: default_width(),
            height: default_height(),
            pixel_aspect_ratio: PixelAspectRatio::default(),
            fields: FieldOrder::default(),
        }
    }
}

impl ExportSettings {
    /// Bind the settings to a source file path, producing full metadata.
    pub fn with_source(self, source_file_path: impl Into<String>) -> SequenceMeta {
        SequenceMeta {
            frame_rate: self.frame_rate,
            width: self.width,
            height: self.height,
            pixel_aspect_ratio: self.pixel_aspect_ratio,
            fields: self.fields,
            source_file_path: source_file_path.into(),
        }
    }
}

/// Full metadata for one exported sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SequenceMeta {
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_aspect_ratio: PixelAspectRatio,
    pub fields: FieldOrder,
    /// Path or file URL of the source video
    pub source_file_path: String,
}

/// A rendered export ready for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportArtifact {
    /// Suggested download file name
    pub file_name: String,
    /// Serialized xmeml document
    pub xml: String,
}

/// Download name for an export of the given source file.
///
/// `talk.mp4` becomes `talk_edited.xml`.
pub fn export_file_name(original_name: &str) -> String {
    let stem = match original_name.rfind('.') {
        Some(idx) if idx > 0 => &original_name[..idx],
        _ => original_name,
    };
    format!("{}_edited.xml", stem)
}

/// Serialize a segment list into an xmeml sequence document.
pub fn create_xml_from_segments(segments: &[SpeechSegment], meta: &SequenceMeta) -> String {
    let rate = meta.frame_rate;
    let file_name = source_name(&meta.source_file_path);
    let sequence_name = format!("{}_edited", strip_extension(&file_name));
    let path_url = path_url(&meta.source_file_path);

    let total_frames: u64 = segments
        .iter()
        .map(|s| to_frames(s.duration(), rate))
        .sum();

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<!DOCTYPE xmeml>\n");
    xml.push_str("<xmeml version=\"4\">\n");
    xml.push_str("  <sequence>\n");
    xml.push_str(&format!("    <name>{}</name>\n", escape_xml(&sequence_name)));
    xml.push_str(&format!("    <duration>{}</duration>\n", total_frames));
    push_rate(&mut xml, "    ", rate);
    xml.push_str("    <media>\n");
    xml.push_str("      <video>\n");
    xml.push_str("        <format>\n");
    push_sample_characteristics(&mut xml, "          ", meta);
    xml.push_str("        </format>\n");
    xml.push_str("        <track>\n");

    let mut timeline_frame: u64 = 0;
    for (index, segment) in segments.iter().enumerate() {
        let clip_id = index + 1;
        let in_frame = to_frames(segment.start, rate);
        let out_frame = to_frames(segment.end, rate);
        let duration = out_frame.saturating_sub(in_frame);
        let start = timeline_frame;
        let end = timeline_frame + duration;
        timeline_frame = end;

        xml.push_str(&format!(
            "          <clipitem id=\"clipitem-{}\">\n",
            clip_id
        ));
        xml.push_str(&format!(
            "            <name>{}</name>\n",
            escape_xml(&file_name)
        ));
        xml.push_str("            <enabled>TRUE</enabled>\n");
        xml.push_str(&format!(
            "            <duration>{}</duration>\n",
            duration
        ));
        push_rate(&mut xml, "            ", rate);
        xml.push_str(&format!("            <start>{}</start>\n", start));
        xml.push_str(&format!("            <end>{}</end>\n", end));
        xml.push_str(&format!("            <in>{}</in>\n", in_frame));
        xml.push_str(&format!("            <out>{}</out>\n", out_frame));

        if index == 0 {
            xml.push_str("            <file id=\"file-1\">\n");
            xml.push_str(&format!(
                "              <name>{}</name>\n",
                escape_xml(&file_name)
            ));
            xml.push_str(&format!(
                "              <pathurl>{}</pathurl>\n",
                escape_xml(&path_url)
            ));
            push_rate(&mut xml, "              ", rate);
            xml.push_str("              <media>\n");
            xml.push_str("                <video>\n");
            push_sample_characteristics(&mut xml, "                  ", meta);
            xml.push_str("                </video>\n");
            xml.push_str("              </media>\n");
            xml.push_str("            </file>\n");
        } else {
            // Later clips reference the file definition from the first clip.
            xml.push_str("            <file id=\"file-1\"/>\n");
        }

        xml.push_str("          </clipitem>\n");
    }

    xml.push_str("        </track>\n");
    xml.push_str("      </video>\n");
    xml.push_str("    </media>\n");
    xml.push_str("  </sequence>\n");
    xml.push_str("</xmeml>\n");

    xml
}

fn push_rate(xml: &mut String, indent: &str, rate: u32) {
    xml.push_str(&format!("{}<rate>\n", indent));
    xml.push_str(&format!("{}  <timebase>{}</timebase>\n", indent, rate));
    xml.push_str(&format!("{}  <ntsc>FALSE</ntsc>\n", indent));
    xml.push_str(&format!("{}</rate>\n", indent));
}

fn push_sample_characteristics(xml: &mut String, indent: &str, meta: &SequenceMeta) {
    xml.push_str(&format!("{}<samplecharacteristics>\n", indent));
    xml.push_str(&format!("{}  <width>{}</width>\n", indent, meta.width));
    xml.push_str(&format!("{}  <height>{}</height>\n", indent, meta.height));
    xml.push_str(&format!(
        "{}  <pixelaspectratio>{}</pixelaspectratio>\n",
        indent,
        meta.pixel_aspect_ratio.as_str()
    ));
    xml.push_str(&format!(
        "{}  <fielddominance>{}</fielddominance>\n",
        indent,
        meta.fields.as_str()
    ));
    xml.push_str(&format!("{}</samplecharacteristics>\n", indent));
}

/// Convert seconds to whole frames at the given rate.
fn to_frames(seconds: f64, rate: u32) -> u64 {
    let frames = seconds * rate as f64;
    if frames <= 0.0 {
        0
    } else {
        frames.round() as u64
    }
}

/// Last path component of the source file path or URL.
fn source_name(source: &str) -> String {
    source
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(source)
        .to_string()
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Build a `file://` URL for the source path.
///
/// Paths that are already URLs pass through untouched; plain paths are
/// percent-encoded per segment.
fn path_url(source: &str) -> String {
    if source.contains("://") {
        return source.to_string();
    }

    let encoded: Vec<String> = source
        .split('/')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect();
    format!("file://localhost{}", encoded.join("/"))
}

/// Escape XML special characters.
fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> SequenceMeta {
        ExportSettings::default().with_source("file://localhost/videos/talk.mp4")
    }

    fn segments() -> Vec<SpeechSegment> {
        vec![
            SpeechSegment::new(0.0, 2.0),
            SpeechSegment::new(5.0, 8.0),
            SpeechSegment::new(10.0, 11.0),
        ]
    }

    #[test]
    fn test_output_is_deterministic() {
        let first = create_xml_from_segments(&segments(), &meta());
        let second = create_xml_from_segments(&segments(), &meta());
        assert_eq!(first, second);
    }

    #[test]
    fn test_one_clipitem_per_segment() {
        let xml = create_xml_from_segments(&segments(), &meta());
        assert_eq!(xml.matches("<clipitem id=").count(), 3);
        // One full file definition, referenced by the remaining clips.
        assert_eq!(xml.matches("<file id=\"file-1\">").count(), 1);
        assert_eq!(xml.matches("<file id=\"file-1\"/>").count(), 2);
    }

    #[test]
    fn test_timeline_is_continuous() {
        let xml = create_xml_from_segments(&segments(), &meta());

        // 2s + 3s + 1s at 60fps.
        assert!(xml.contains("<duration>360</duration>"));

        // First clip: timeline 0..120, source 0..120.
        assert!(xml.contains("<start>0</start>"));
        assert!(xml.contains("<end>120</end>"));
        // Second clip starts where the first ended but keeps its source timecode.
        assert!(xml.contains("<start>120</start>"));
        assert!(xml.contains("<in>300</in>"));
        assert!(xml.contains("<out>480</out>"));
    }

    #[test]
    fn test_source_path_is_escaped() {
        let meta = ExportSettings::default().with_source("/videos/cats & dogs <v1>.mp4");
        let xml = create_xml_from_segments(&segments(), &meta);

        assert!(xml.contains("cats%20%26%20dogs%20%3Cv1%3E.mp4"));
        assert!(!xml.contains("cats & dogs <v1>.mp4"));
        // The clip name keeps the raw text but XML-escaped.
        assert!(xml.contains("cats &amp; dogs &lt;v1&gt;.mp4"));
    }

    #[test]
    fn test_url_sources_pass_through() {
        let meta = ExportSettings::default().with_source("file://localhost/videos/talk.mp4");
        let xml = create_xml_from_segments(&segments(), &meta);
        assert!(xml.contains("<pathurl>file://localhost/videos/talk.mp4</pathurl>"));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("talk.mp4"), "talk_edited.xml");
        assert_eq!(export_file_name("a.b.mov"), "a.b_edited.xml");
        assert_eq!(export_file_name("raw"), "raw_edited.xml");
    }

    #[test]
    fn test_sequence_metadata_is_rendered() {
        let xml = create_xml_from_segments(&segments(), &meta());
        assert!(xml.contains("<timebase>60</timebase>"));
        assert!(xml.contains("<width>2560</width>"));
        assert!(xml.contains("<height>1440</height>"));
        assert!(xml.contains("<pixelaspectratio>square</pixelaspectratio>"));
        assert!(xml.contains("<fielddominance>none</fielddominance>"));
        assert!(xml.contains("<name>talk_edited</name>"));
    }

    #[test]
    fn test_empty_segment_list_serializes() {
        let xml = create_xml_from_segments(&[], &meta());
        assert!(xml.contains("<duration>0</duration>"));
        assert!(!xml.contains("<clipitem"));
    }
}
