//! Watermark compositing, always the final video stage.

use std::path::Path;

use vidforge_common::Watermark;

use super::{FilterChain, HW_UPLOAD};

/// Output pad label of the image-watermark graph.
pub const OUTPUT_PAD: &str = "vout";

/// Escape characters that break drawtext option parsing.
pub fn escape_drawtext(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Bottom-right drawtext filter with opacity-derived fill and outline.
pub fn drawtext(text: &str, font: &Path, font_size: u32, alpha: f64, inset: u32) -> String {
    format!(
        "drawtext=fontfile='{font}':text='{text}':fontsize={font_size}:fontcolor=white@{alpha:.2}:borderw=2:bordercolor=black@{outline:.2}:x=w-tw-{inset}:y=h-th-{inset}",
        font = font.display(),
        text = escape_drawtext(text),
        outline = alpha * 0.6,
    )
}

/// Append the watermark to the compiled filters.
///
/// `hw_upload` adds the VAAPI upload step after the watermark, on whichever
/// representation is produced.
pub fn apply(watermark: &Watermark, mut filters: Vec<String>, hw_upload: bool) -> FilterChain {
    match watermark {
        Watermark::Image { path, inset, .. } => {
            let mut graph = String::new();
            let main = if filters.is_empty() {
                "[0:v]"
            } else {
                graph.push_str(&format!("[0:v]{}[base];", filters.join(",")));
                "[base]"
            };

            graph.push_str(&format!(
                "[1:v]format=rgba,colorchannelmixer=aa={:.2}[wm];",
                watermark.alpha()
            ));
            graph.push_str(&format!("{main}[wm]overlay=W-w-{inset}:H-h-{inset}"));
            if hw_upload {
                graph.push(',');
                graph.push_str(HW_UPLOAD);
            }
            graph.push_str(&format!("[{OUTPUT_PAD}]"));

            FilterChain::Graph {
                extra_input: path.clone(),
                graph,
                output_pad: OUTPUT_PAD.to_string(),
            }
        }
        Watermark::Text {
            text,
            font,
            font_size,
            inset,
            ..
        } => {
            filters.push(drawtext(text, font, *font_size, watermark.alpha(), *inset));
            if hw_upload {
                filters.push(HW_UPLOAD.to_string());
            }
            FilterChain::Linear(filters)
        }
        Watermark::Disabled => {
            if hw_upload {
                filters.push(HW_UPLOAD.to_string());
            }
            FilterChain::Linear(filters)
        }
    }
}
