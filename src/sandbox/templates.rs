//! Entry-program generators, one per [`TemplateKind`].
//!
//! Every draw call that can fail for a single font is wrapped so the
//! failure yields an empty graphic instead of aborting the whole program.

use crate::model::{Alignment, BuildUnit, FaceSet, OutputKind, TemplateKind};

/// File name of the generated entry program.
pub const ENTRY_FILE: &str = "main.mbt";

/// Placeholder drawn when a font fails to render.
const EMPTY_GRAPHIC: &str = "@draw.group([]).as_graphic()";

const GRID_CELL_WIDTH: f64 = 12.0;
const LINE_HEIGHT: f64 = 1.2;
const LINE_SPACING: f64 = 0.2;

/// Generates the entry program for `unit`.
pub fn entry_program(unit: &BuildUnit) -> String {
    match &unit.template {
        TemplateKind::Serialize => serialize_program(unit),
        TemplateKind::RenderLine {
            faces,
            lines,
            output,
            align,
            y_up,
        } => render_line_program(faces, lines, *output, *align, *y_up),
        TemplateKind::RenderGrid {
            label,
            lines,
            columns,
        } => render_grid_program(unit, label.leaf(), lines, *columns),
    }
}

fn serialize_program(unit: &BuildUnit) -> String {
    let mut src = vec!["fn main {".to_string()];
    for pkg in &unit.packages {
        src.push(format!("  println(@{}.font.to_json().stringify())", pkg.leaf()));
    }
    src.push("}".to_string());
    src.join("\n")
}

/// Face selected by a line's inline markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
    Italic,
}

impl Face {
    fn binding(&self) -> &'static str {
        match self {
            Face::Regular => "font_regular",
            Face::Bold => "font_bold",
            Face::Italic => "font_italic",
        }
    }
}

/// Strips a whole-line `**bold**`, `__bold__`, `*italic*` or `_italic_` wrapper.
pub fn strip_markers(line: &str) -> (Face, &str) {
    const MARKERS: [(&str, Face); 4] = [
        ("**", Face::Bold),
        ("__", Face::Bold),
        ("*", Face::Italic),
        ("_", Face::Italic),
    ];
    for (marker, face) in MARKERS {
        if line.starts_with(marker) && line.ends_with(marker) {
            let inner = line.get(marker.len()..line.len() - marker.len()).unwrap_or("");
            return (face, inner);
        }
    }
    (Face::Regular, line)
}

/// Escapes text for a double-quoted string literal in the generated program.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn scene_alignment(align: Alignment) -> &'static str {
    match align {
        Alignment::Left => "CenterLeft",
        Alignment::Center => "Center",
        Alignment::Right => "CenterRight",
    }
}

fn render_line_program(
    faces: &FaceSet,
    lines: &[String],
    output: OutputKind,
    align: Alignment,
    y_up: bool,
) -> String {
    let mut src = vec!["fn main {".to_string()];
    src.push(format!("  let font_regular = @{}.font", faces.regular.leaf()));
    for (face, pkg) in [(Face::Bold, &faces.bold), (Face::Italic, &faces.italic)] {
        match pkg {
            Some(pkg) => src.push(format!("  let {} = @{}.font", face.binding(), pkg.leaf())),
            None => src.push(format!("  let {} = font_regular", face.binding())),
        }
    }

    src.push("  let lines = [".to_string());
    for line in lines {
        let (face, text) = strip_markers(line);
        src.push(format!(
            "    try {{ @draw.text({}, \"{}\", y_up={y_up}) }} catch {{ _ => {EMPTY_GRAPHIC} }},",
            face.binding(),
            escape_literal(text),
        ));
    }
    src.push("  ]".to_string());
    src.push(format!(
        "  let scene = @draw.column(lines, alignment=@geom.{}, spacing={LINE_SPACING:?})",
        scene_alignment(align)
    ));

    match output {
        OutputKind::Json => src.push("  println(scene.to_json().stringify())".to_string()),
        OutputKind::Svg => push_svg_print(&mut src, "scene", 0.1, y_up),
    }
    src.push("}".to_string());
    src.join("\n")
}

fn render_grid_program(unit: &BuildUnit, label_alias: &str, lines: &[String], columns: usize) -> String {
    let columns = columns.max(1);
    let sample: Vec<String> = lines.iter().map(|l| escape_literal(l)).collect();
    let row_height = LINE_HEIGHT + lines.len() as f64 * LINE_HEIGHT;

    let mut src = vec!["fn main {".to_string()];
    src.push(format!("  let sample_text = \"{}\"", sample.join("\\n")));
    src.push(format!("  let mut scene = {EMPTY_GRAPHIC}"));

    for (i, pkg) in unit.packages.iter().enumerate() {
        let alias = pkg.leaf();
        let x = (i % columns) as f64 * GRID_CELL_WIDTH;
        let y = (i / columns) as f64 * row_height;
        src.push(format!("  // Font {i}: {alias}"));
        src.push(format!(
            "  let label = try {{ @draw.text(@{label_alias}.font, \"{}\").scale(@geom.vec2(0.3, 0.3)).translate(@geom.vec2(0.0, -0.8)) }} catch {{ _ => {EMPTY_GRAPHIC} }}",
            escape_literal(alias)
        ));
        src.push(format!(
            "  let sample = try {{ @draw.text(@{alias}.font, sample_text) }} catch {{ _ => {EMPTY_GRAPHIC} }}"
        ));
        src.push(format!(
            "  scene = scene + (label + sample).translate(@geom.vec2({x:?}, {y:?}))"
        ));
    }

    push_svg_print(&mut src, "scene", 0.5, false);
    src.push("}".to_string());
    src.join("\n")
}

fn push_svg_print(src: &mut Vec<String>, scene: &str, margin: f64, y_up: bool) {
    src.push("  println(".to_string());
    src.push("    @svg.from_graphic(".to_string());
    src.push(format!("      {scene}"));
    src.push(format!(
        "      .with_margin(top={margin:?}, right={margin:?}, bottom={margin:?}, left={margin:?})"
    ));
    src.push("      .with_background(@draw.Color::white()),".to_string());
    src.push(format!("      y_up={y_up},"));
    src.push("    ).to_string(),".to_string());
    src.push("  )".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactTarget;
    use crate::model::{Package, UnitRole};

    fn pkg(id: &str) -> Package {
        Package::parse(id).unwrap()
    }

    fn unit(packages: Vec<Package>, template: TemplateKind) -> BuildUnit {
        BuildUnit {
            name: "t".into(),
            role: UnitRole::Single,
            packages,
            batch: None,
            template,
            target: ArtifactTarget::Stdout,
        }
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("**Title**"), (Face::Bold, "Title"));
        assert_eq!(strip_markers("__Title__"), (Face::Bold, "Title"));
        assert_eq!(strip_markers("*note*"), (Face::Italic, "note"));
        assert_eq!(strip_markers("_note_"), (Face::Italic, "note"));
        assert_eq!(strip_markers("plain *mixed* text"), (Face::Regular, "plain *mixed* text"));
        assert_eq!(strip_markers("*"), (Face::Italic, ""));
        assert_eq!(strip_markers("***"), (Face::Bold, ""));
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r#"say "hi" \o/"#), r#"say \"hi\" \\o/"#);
    }

    #[test]
    fn test_serialize_program() {
        let u = unit(vec![pkg("gmlewis/fonts-a/abeezee_regular")], TemplateKind::Serialize);
        let src = entry_program(&u);
        assert!(src.starts_with("fn main {"));
        assert!(src.contains("println(@abeezee_regular.font.to_json().stringify())"));
    }

    #[test]
    fn test_render_line_program_faces_and_fallbacks() {
        let faces = FaceSet {
            regular: pkg("gmlewis/fonts-a/abeezee_regular"),
            bold: None,
            italic: Some(pkg("gmlewis/fonts-a/abeezee_italic")),
        };
        let template = TemplateKind::RenderLine {
            faces,
            lines: vec!["**Head**".into(), "_aside_".into(), "say \"x\"".into()],
            output: OutputKind::Json,
            align: Alignment::Center,
            y_up: true,
        };
        let src = entry_program(&unit(vec![pkg("gmlewis/fonts-a/abeezee_regular")], template));

        assert!(src.contains("let font_bold = font_regular"));
        assert!(src.contains("let font_italic = @abeezee_italic.font"));
        assert!(src.contains("@draw.text(font_bold, \"Head\", y_up=true)"));
        assert!(src.contains("@draw.text(font_italic, \"aside\", y_up=true)"));
        assert!(src.contains("\"say \\\"x\\\"\""));
        assert_eq!(src.matches("catch { _ => @draw.group([]).as_graphic() }").count(), 3);
        assert!(src.contains("alignment=@geom.Center, spacing=0.2"));
        assert!(src.contains("println(scene.to_json().stringify())"));
    }

    #[test]
    fn test_render_line_svg_output() {
        let template = TemplateKind::RenderLine {
            faces: FaceSet {
                regular: pkg("gmlewis/fonts-a/abeezee_regular"),
                bold: None,
                italic: None,
            },
            lines: vec!["hello".into()],
            output: OutputKind::Svg,
            align: Alignment::Left,
            y_up: false,
        };
        let src = entry_program(&unit(vec![pkg("gmlewis/fonts-a/abeezee_regular")], template));
        assert!(src.contains("@svg.from_graphic("));
        assert!(src.contains("with_margin(top=0.1"));
        assert!(src.contains("y_up=false,"));
        assert!(src.contains("@geom.CenterLeft"));
    }

    #[test]
    fn test_render_grid_layout() {
        let packages: Vec<Package> = (0..8)
            .map(|i| pkg(&format!("gmlewis/fonts-a/font{i}_regular")))
            .collect();
        let template = TemplateKind::RenderGrid {
            label: pkg("gmlewis/fonts-a/aileron_bold"),
            lines: vec!["ABC".into(), "abc".into()],
            columns: 6,
        };
        let src = entry_program(&unit(packages, template));

        assert!(src.contains("let sample_text = \"ABC\\nabc\""));
        assert!(src.contains("@draw.text(@aileron_bold.font, \"font7_regular\")"));
        // 8th font wraps to column 1 of row 1; row height 1.2 + 2 * 1.2
        assert!(src.contains("translate(@geom.vec2(12.0, 3.5"));
        assert!(src.contains("translate(@geom.vec2(60.0, 0.0))"));
        assert_eq!(src.matches("// Font ").count(), 8);
        assert!(src.contains("with_margin(top=0.5"));
    }
}
