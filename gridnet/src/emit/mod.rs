//! Text artifacts produced from a valid circuit.

pub mod schematic;
pub mod spice;

pub use schematic::SchematicEmitter;
pub use spice::SpiceEmitter;

use crate::netlist::BuildFailure;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("cannot emit an invalid circuit: {0}")]
    InvalidCircuit(BuildFailure),
}

const DOCUMENT_TEMPLATE: &str = r"\documentclass[border=10pt]{standalone}
\usepackage{tikz}
\usepackage{circuitikz}
\tikzset{every node/.style={font=<font>}}
\tikzset{every draw/.style={font=<font>}}
\begin{document}
\begin{circuitikz}[line width=1pt]
\ctikzset{tripoles/en amp/input height=0.5};
\ctikzset{inductors/scale=1.2, inductor=american}
\ctikzset{tripoles/mos style/arrows}
<main>
\end{circuitikz}
\end{document}";

/// Embed a circuitikz fragment in a standalone LaTeX document.
pub fn wrap_document(fragment: &str, font_size: &str) -> String {
    DOCUMENT_TEMPLATE
        .replace("<font>", font_size)
        .replace("<main>", fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_document() {
        let doc = wrap_document("\\draw (0.0,0.0) to[short] (3.0,0.0);\n", "\\large");
        assert!(doc.starts_with("\\documentclass[border=10pt]{standalone}"));
        assert!(doc.contains("font=\\large}"));
        assert!(doc.contains("\\draw (0.0,0.0) to[short] (3.0,0.0);\n\n\\end{circuitikz}"));
        assert!(!doc.contains("<main>"));
        assert!(doc.ends_with("\\end{document}"));
    }
}
