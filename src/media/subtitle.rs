//! ASS subtitle script for word overlays
//!
//! The script's play resolution equals the output canvas, so font sizes and
//! margins are expressed in final-frame pixels.

use super::overlay::{rgb_to_ass, OverlayStyle, SubtitleOverlay};

const STYLE_NAME: &str = "Word";

/// ASS script for a fixed canvas
#[derive(Debug, Clone)]
pub struct AssScript {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub style: OverlayStyle,
}

impl AssScript {
    #[must_use]
    pub fn new(play_res_x: u32, play_res_y: u32, style: OverlayStyle) -> Self {
        Self {
            play_res_x,
            play_res_y,
            style,
        }
    }

    fn style_line(&self) -> String {
        let s = &self.style;
        format!(
            "Style: {STYLE_NAME},{},{},{},&H000000FF,{},&H00000000,{},0,0,0,100,100,0,0,1,{},0,{},20,20,{},1",
            s.font_name,
            s.font_size,
            rgb_to_ass(&s.color),
            rgb_to_ass(&s.outline_color),
            if s.bold { -1 } else { 0 },
            s.outline_width,
            s.position.to_ass_alignment(),
            s.margin,
        )
    }

    /// Render the complete script, one dialogue event per overlay
    #[must_use]
    pub fn render(&self, overlays: &[SubtitleOverlay]) -> String {
        let mut out = String::new();

        out.push_str("[Script Info]\n");
        out.push_str("Title: clipcast\n");
        out.push_str("ScriptType: v4.00+\n");
        out.push_str(&format!("PlayResX: {}\n", self.play_res_x));
        out.push_str(&format!("PlayResY: {}\n", self.play_res_y));
        out.push_str("WrapStyle: 2\n");
        out.push_str("ScaledBorderAndShadow: yes\n");
        out.push_str("YCbCr Matrix: TV.709\n\n");

        out.push_str("[V4+ Styles]\n");
        out.push_str(
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
             OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, \
             ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, \
             MarginL, MarginR, MarginV, Encoding\n",
        );
        out.push_str(&self.style_line());
        out.push_str("\n\n");

        out.push_str("[Events]\n");
        out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
        for overlay in overlays {
            out.push_str(&format!(
                "Dialogue: 0,{},{},{STYLE_NAME},,0,0,0,,{}\n",
                format_ass_time(overlay.start),
                format_ass_time(overlay.end),
                escape_text(&overlay.text),
            ));
        }

        out
    }
}

/// Format seconds as an ASS timestamp (H:MM:SS.cc)
#[must_use]
pub fn format_ass_time(seconds: f64) -> String {
    let cs = (seconds.max(0.0) * 100.0).round() as u64;
    let hours = cs / 360_000;
    let minutes = (cs % 360_000) / 6_000;
    let secs = (cs % 6_000) / 100;
    let centis = cs % 100;
    format!("{hours}:{minutes:02}:{secs:02}.{centis:02}")
}

// Braces open override blocks and backslashes start escapes in ASS text.
fn escape_text(text: &str) -> String {
    text.replace('\\', "/")
        .replace('{', "(")
        .replace('}', ")")
        .replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(text: &str, start: f64, end: f64) -> SubtitleOverlay {
        SubtitleOverlay {
            text: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(1.234), "0:00:01.23");
        assert_eq!(format_ass_time(61.5), "0:01:01.50");
        assert_eq!(format_ass_time(3725.07), "1:02:05.07");
    }

    #[test]
    fn test_render_uses_canvas_resolution() {
        let script = AssScript::new(1080, 1920, OverlayStyle::default());
        let ass = script.render(&[]);
        assert!(ass.contains("PlayResX: 1080"));
        assert!(ass.contains("PlayResY: 1920"));
        assert!(ass.contains("Style: Word,Arial,60,&H00FFFFFF"));
        assert!(!ass.contains("Dialogue:"));
    }

    #[test]
    fn test_render_one_event_per_overlay() {
        let script = AssScript::new(1080, 1920, OverlayStyle::default());
        let ass = script.render(&[overlay("Salut", 0.0, 0.42), overlay("{toi}", 0.5, 1.0)]);

        let events: Vec<&str> = ass.lines().filter(|l| l.starts_with("Dialogue:")).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], "Dialogue: 0,0:00:00.00,0:00:00.42,Word,,0,0,0,,Salut");
        assert!(events[1].ends_with(",(toi)"));
    }

    #[test]
    fn test_style_line_field_count() {
        let script = AssScript::new(1080, 1920, OverlayStyle::default());
        let line = script.style_line();
        let fields = line.trim_start_matches("Style: ").split(',').count();
        assert_eq!(fields, 23);
        // bottom-center alignment, margin
        assert!(line.ends_with(",2,20,20,50,1"));
    }
}
