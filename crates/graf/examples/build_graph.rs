//! Builds a two-layer annotation graph from hand-rolled events and prints it.

use graf::{
    parse_events, FeatureValue, Graph, ParseOptions, SaxEvent, StaticLoader, GRAF_NAMESPACE,
};

fn format_value(value: &FeatureValue) -> String {
    match value {
        FeatureValue::Atomic(s) => format!("{s:?}"),
        FeatureValue::Nested(fs) => {
            let inner: Vec<String> = fs
                .iter()
                .map(|f| format!("{}={}", f.name, format_value(&f.value)))
                .collect();
            format!("[{}]", inner.join(", "))
        }
    }
}

/// Segmentation layer: one node and one region per token of the primary
/// text "The dog barks".
fn segmentation_doc() -> Vec<SaxEvent> {
    vec![
        SaxEvent::open("graph").attr("xmlns", GRAF_NAMESPACE),
        SaxEvent::open("node").attr("xml:id", "seg-n0"),
        SaxEvent::close("node"),
        SaxEvent::open("region").attr("xml:id", "seg-r0").attr("anchors", "0 3"),
        SaxEvent::close("region"),
        SaxEvent::open("node").attr("xml:id", "seg-n1"),
        SaxEvent::close("node"),
        SaxEvent::open("region").attr("xml:id", "seg-r1").attr("anchors", "4 7"),
        SaxEvent::close("region"),
        SaxEvent::open("node").attr("xml:id", "seg-n2"),
        SaxEvent::close("node"),
        SaxEvent::open("region").attr("xml:id", "seg-r2").attr("anchors", "8 13"),
        SaxEvent::close("region"),
        SaxEvent::close("graph"),
    ]
}

/// Syntax layer: a phrase node dominating the segmentation tokens, with
/// part-of-speech annotations on the token nodes of the dependency.
fn syntax_doc() -> Vec<SaxEvent> {
    vec![
        SaxEvent::open("graph").attr("xmlns", GRAF_NAMESPACE),
        SaxEvent::open("graphHeader"),
        SaxEvent::open("labelsDecl"),
        SaxEvent::open("labelUsage").attr("label", "tok").attr("occurs", "3"),
        SaxEvent::close("labelUsage"),
        SaxEvent::close("labelsDecl"),
        SaxEvent::open("dependencies"),
        SaxEvent::open("dependsOn").attr("f.id", "f.seg"),
        SaxEvent::close("dependsOn"),
        SaxEvent::close("dependencies"),
        SaxEvent::open("roots"),
        SaxEvent::open("root"),
        SaxEvent::text("ptb-n0"),
        SaxEvent::close("root"),
        SaxEvent::close("roots"),
        SaxEvent::close("graphHeader"),
        SaxEvent::open("node").attr("xml:id", "ptb-n0"),
        SaxEvent::close("node"),
        // The token nodes live in the segmentation document; edges may
        // reference them before the dependency is merged.
        SaxEvent::open("edge").attr("xml:id", "ptb-e0").attr("from", "ptb-n0").attr("to", "seg-n0"),
        SaxEvent::close("edge"),
        SaxEvent::open("edge").attr("xml:id", "ptb-e1").attr("from", "ptb-n0").attr("to", "seg-n1"),
        SaxEvent::close("edge"),
        SaxEvent::open("edge").attr("xml:id", "ptb-e2").attr("from", "ptb-n0").attr("to", "seg-n2"),
        SaxEvent::close("edge"),
        SaxEvent::open("a").attr("xml:id", "ptb-a0").attr("label", "S").attr("ref", "ptb-n0").attr("as", "ptb"),
        SaxEvent::close("a"),
        SaxEvent::open("a").attr("xml:id", "ptb-a1").attr("label", "DT").attr("ref", "seg-n0").attr("as", "ptb"),
        SaxEvent::open("fs"),
        SaxEvent::open("f").attr("name", "base").attr("value", "the"),
        SaxEvent::close("f"),
        SaxEvent::close("fs"),
        SaxEvent::close("a"),
        SaxEvent::open("a").attr("xml:id", "ptb-a2").attr("label", "NN").attr("ref", "seg-n1").attr("as", "ptb"),
        SaxEvent::open("fs"),
        SaxEvent::open("f").attr("name", "base").attr("value", "dog"),
        SaxEvent::close("f"),
        SaxEvent::open("f").attr("name", "agr"),
        SaxEvent::open("fs"),
        SaxEvent::open("f").attr("name", "num").attr("value", "sg"),
        SaxEvent::close("f"),
        SaxEvent::open("f").attr("name", "per").attr("value", "3"),
        SaxEvent::close("f"),
        SaxEvent::close("fs"),
        SaxEvent::close("f"),
        SaxEvent::close("fs"),
        SaxEvent::close("a"),
        SaxEvent::open("a").attr("xml:id", "ptb-a3").attr("label", "VBZ").attr("ref", "seg-n2").attr("as", "ptb"),
        SaxEvent::close("a"),
        SaxEvent::close("graph"),
    ]
}

fn print_graph(graph: &Graph) {
    println!("=== Graph ===");
    println!("Root: {}", graph.root_id().unwrap_or("(none)"));
    println!(
        "Nodes: {}, Edges: {}, Regions: {}",
        graph.nodes().count(),
        graph.edges().count(),
        graph.regions().count()
    );
    for dep in &graph.header.depends {
        println!("Depends on: {} ({})", dep.locator, dep.key);
    }
    for usage in &graph.header.label_usage {
        println!("Label {}: {} occurrences", usage.label, usage.occurs);
    }

    println!("\n=== Nodes ===");
    for node in graph.nodes() {
        println!(
            "{}  out={:?} in={:?} regions={:?} annotations={}",
            node.id,
            node.out_edges,
            node.in_edges,
            node.regions,
            node.annotations.len()
        );
    }

    println!("\n=== Regions ===");
    for region in graph.regions() {
        println!("{}  anchors={:?} node={}", region.id, region.anchors, region.node);
    }

    println!("\n=== Annotations ===");
    for set in graph.annotation_sets() {
        println!("set {} (space {}):", set.id, set.space);
        for ann in set.iter() {
            let kind = ann
                .target_kind
                .map(|k| k.category())
                .unwrap_or("unresolved");
            let features = match &ann.features {
                Some(fs) => fs
                    .iter()
                    .map(|f| format!("{}={}", f.name, format_value(&f.value)))
                    .collect::<Vec<_>>()
                    .join(", "),
                None => String::new(),
            };
            println!("  [{}] {} -> {} {} {}", ann.id, ann.label, kind, ann.target, features);
        }
    }
}

fn main() {
    let mut loader = StaticLoader::new();
    loader.insert("f.seg", segmentation_doc());

    let graph = parse_events(syntax_doc(), &mut loader, ParseOptions::default())
        .expect("Failed to parse");

    print_graph(&graph);
}
