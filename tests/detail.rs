use discopath::detail::{LAYOUT_LINE_PREFIXES, is_layout_line, strip_layout_markup};

const GPML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="Apoptosis" Organism="Homo sapiens">
  <Comment Source="WikiPathways-description">Apoptosis is programmed cell death.</Comment>
  <BiopaxRef>c3a</BiopaxRef>
  <Graphics BoardWidth="1200.0" BoardHeight="900.0" />
  <DataNode TextLabel="TP53" GraphId="a1" Type="GeneProduct">
    <Graphics CenterX="100.0" CenterY="80.0" Width="80.0" Height="20.0" />
    <Xref Database="Entrez Gene" ID="7157" />
  </DataNode>
  <Interaction GraphId="i1">
    <Graphics ZOrder="12288">
      <Point X="140.0" Y="80.0" GraphRef="a1" RelX="1.0" RelY="0.0" />
      <Point X="300.0" Y="80.0" ArrowHead="Arrow" />
      <Anchor Position="0.5" Shape="None" GraphId="an1" />
    </Graphics>
  </Interaction>
  <Label TextLabel="Mitochondrion" GraphId="l1">
  </Label>
  <Shape TextLabel="" GraphId="s1">
  </Shape>
  <Group GroupId="g1" GraphId="gr1" />
  </Group>
  <InfoBox CenterX="0.0" CenterY="0.0" />
  <Biopax>
    <bp:PublicationXref xmlns:bp="http://www.biopax.org/release/biopax-level3.owl#" rdf:id="c3a">
      <bp:ID rdf:datatype="http://www.w3.org/2001/XMLSchema#string">10498867</bp:ID>
      <bp:DB rdf:datatype="http://www.w3.org/2001/XMLSchema#string">PubMed</bp:DB>
      <bp:TITLE rdf:datatype="http://www.w3.org/2001/XMLSchema#string">Apoptosis review</bp:TITLE>
    </bp:PublicationXref>
  </Biopax>
</Pathway>"#;

#[test]
fn strips_layout_and_reference_lines() {
    let cleaned = strip_layout_markup(GPML);
    assert_eq!(
        cleaned,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="Apoptosis" Organism="Homo sapiens">
  <Comment Source="WikiPathways-description">Apoptosis is programmed cell death.</Comment>
  <Biopax>
    <bp:PublicationXref xmlns:bp="http://www.biopax.org/release/biopax-level3.owl#" rdf:id="c3a">
      <bp:ID rdf:datatype="http://www.w3.org/2001/XMLSchema#string">10498867</bp:ID>
      <bp:TITLE rdf:datatype="http://www.w3.org/2001/XMLSchema#string">Apoptosis review</bp:TITLE>
  </Biopax>
</Pathway>"#
    );
}

#[test]
fn stripping_is_idempotent() {
    let once = strip_layout_markup(GPML);
    let twice = strip_layout_markup(&once);
    assert_eq!(once, twice);
    assert!(once.split('\n').all(|line| !is_layout_line(line)));
}

#[test]
fn output_keeps_relative_line_order() {
    let input = "keep 1\n<Point X=\"1\" />\nkeep 2\n   <Anchor />\nkeep 3";
    assert_eq!(strip_layout_markup(input), "keep 1\nkeep 2\nkeep 3");
}

#[test]
fn bare_x_prefix_drops_text_lines_starting_with_x() {
    // Content lines that begin with an upper-case X are lost along with markup.
    let input = "Xenobiotic metabolism overview\nxenobiotic lower case survives\n  X-linked inheritance\nCYP1A1 detail";
    assert_eq!(
        strip_layout_markup(input),
        "xenobiotic lower case survives\nCYP1A1 detail"
    );
}

#[test]
fn prefix_table_is_fixed() {
    assert_eq!(LAYOUT_LINE_PREFIXES.len(), 24);
    assert!(LAYOUT_LINE_PREFIXES.contains(&"X"));
    assert!(LAYOUT_LINE_PREFIXES.contains(&"</bp:PublicationXref"));
}

#[test]
fn empty_and_blank_lines_survive() {
    assert_eq!(strip_layout_markup(""), "");
    assert_eq!(strip_layout_markup("a\n\n  \nb"), "a\n\n  \nb");
}
