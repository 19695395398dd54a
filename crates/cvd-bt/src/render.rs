//! Diagnostic renderings of a tree. None of this affects tick semantics.

use std::fmt::Write;

use crate::node::Node;

impl<B> Node<B> {
    /// Indented outline, one node per line, ` | ` per depth level.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out, 0);
        out
    }

    fn write_text(&self, out: &mut String, depth: usize) {
        let _ = writeln!(
            out,
            "{}({}) {}",
            " | ".repeat(depth),
            self.prefix(),
            self.label()
        );
        for child in self.children() {
            child.write_text(out, depth + 1);
        }
    }

    /// Mermaid `graph TD` block of every node, leaves included, with one
    /// edge per parent and child.
    pub fn to_mermaid(&self) -> String {
        let mut lines = vec!["```mermaid".to_string(), "graph TD".to_string()];
        lines.push(format!("  n{}[\"{} {}\"]", self.id(), self.prefix(), self.name()));
        self.write_mermaid_edges(&mut lines);
        lines.push("```".to_string());
        lines.join("\n")
    }

    fn write_mermaid_edges(&self, lines: &mut Vec<String>) {
        for child in self.children() {
            lines.push(format!(
                "  n{}[\"{} {}\"]",
                child.id(),
                child.prefix(),
                child.name()
            ));
            lines.push(format!("  n{} --> n{}", self.id(), child.id()));
            child.write_mermaid_edges(lines);
        }
    }

    /// Graphviz digraph. Leaves are drawn as ellipses.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph bt {\n");
        self.write_dot(&mut out);
        out.push_str("}\n");
        out
    }

    fn write_dot(&self, out: &mut String) {
        let shape = if self.is_leaf() { "ellipse" } else { "box" };
        let _ = writeln!(
            out,
            "  n{} [label=\"{} {}\", shape={}];",
            self.id(),
            self.prefix(),
            self.name(),
            shape
        );
        for child in self.children() {
            let _ = writeln!(out, "  n{} -> n{};", self.id(), child.id());
            child.write_dot(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::blackboard::Blackboard;
    use crate::fuzzer::USUALLY_FAIL;
    use crate::spec::NodeSpec;
    use rand::rngs::StdRng;

    struct Bb(StdRng);

    impl Blackboard for Bb {
        fn rng(&mut self) -> &mut StdRng {
            &mut self.0
        }
    }

    fn sample() -> crate::Node<Bb> {
        NodeSpec::<Bb>::fallback(
            "Root",
            vec![
                NodeSpec::check("IsReady", |_| true),
                NodeSpec::sequence(
                    "Work",
                    vec![NodeSpec::fuzzer("Maybe", USUALLY_FAIL), NodeSpec::succeed("Do")],
                ),
            ],
        )
        .build()
        .unwrap()
    }

    #[test]
    fn test_text_outline() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "(?) Root_1");
        assert_eq!(lines[1], " | (c) IsReady_2");
        assert_eq!(lines[2], " | (>) Work_3");
        assert_eq!(lines[3], " |  | (z) Maybe_4");
        assert_eq!(lines[4], " |  | (a) Do_5");
    }

    #[test]
    fn test_mermaid_and_dot_edges() {
        let tree = sample();
        let mermaid = tree.to_mermaid();
        assert!(mermaid.starts_with("```mermaid\ngraph TD"));
        assert!(mermaid.contains("n1 --> n3"));
        assert!(mermaid.contains("n3 --> n5"));
        assert!(mermaid.contains("n4[\"z Maybe\"]"));
        assert!(mermaid.contains("n2[\"c IsReady\"]"));

        let dot = tree.to_dot();
        assert!(dot.contains("n3 -> n4;"));
        assert!(dot.contains("shape=ellipse"));
    }
}
