use maud::{html, Markup, PreEscaped, DOCTYPE};

/// Page orientation for `@page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    fn css(self) -> &'static str {
        match self {
            Orientation::Landscape => "A4 landscape",
            Orientation::Portrait => "A4 portrait",
        }
    }
}

const BASE_CSS: &str = r#"
body { font-family: "DejaVu Sans", Arial, sans-serif; color: #1f2937; margin: 0; }
.ticket { display: flex; border: 2px solid #1f2937; border-radius: 8px; margin: 12mm; min-height: 150mm; }
.ticket-left { width: 32%; padding: 8mm; border-right: 2px dashed #9ca3af; background: #f3f4f6; }
.ticket-right { flex: 1; padding: 8mm; }
.voucher-code { font-size: 20px; font-weight: bold; letter-spacing: 1px; margin: 6mm 0 2mm; }
.muted { color: #6b7280; font-size: 12px; }
table.fields { width: 100%; border-collapse: collapse; }
table.fields th { text-align: left; width: 40%; padding: 6px 8px; font-size: 13px; color: #374151; }
table.fields td { padding: 6px 8px; font-size: 14px; border-bottom: 1px solid #e5e7eb; }
@media print { .no-print { display: none; } }
"#;

/// Bare document for printing; no navigation or scripts.
pub fn print_layout(title: &str, orientation: Orientation, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                style {
                    (PreEscaped(format!("@page {{ size: {}; margin: 0; }}", orientation.css())))
                    (PreEscaped(BASE_CSS))
                }
            }
            body {
                (content)
                p class="no-print muted" style="text-align:center" {
                    button onclick="window.print()" { "Yazdır / Print" }
                }
            }
        }
    }
}
