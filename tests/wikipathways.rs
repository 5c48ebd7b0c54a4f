use assert_matches::assert_matches;

use discopath::domain::PathwayCandidate;
use discopath::error::DiscoError;
use discopath::wikipathways::parse_pathways;

const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ns1:findPathwaysByTextResponse xmlns:ns1="http://www.wso2.org/php/xsd" xmlns:ns2="http://www.wikipathways.org/webservice">
  <ns1:result>
    <ns2:score>3.42</ns2:score>
    <ns2:id>WP707</ns2:id>
    <ns2:url>https://www.wikipathways.org/index.php/Pathway:WP707</ns2:url>
    <ns2:name>DNA damage response</ns2:name>
    <ns2:species>Homo sapiens</ns2:species>
    <ns2:revision>117225</ns2:revision>
  </ns1:result>
  <ns1:result>
    <ns2:id>WP2261</ns2:id>
    <ns2:name>Signaling pathways in glioblastoma &amp; astrocytoma</ns2:name>
  </ns1:result>
  <ns1:result>
    <ns2:id>WP9999</ns2:id>
    <ns2:species>Homo sapiens</ns2:species>
  </ns1:result>
  <ns1:result>
    <ns2:id></ns2:id>
    <ns2:name>Nameless id</ns2:name>
  </ns1:result>
</ns1:findPathwaysByTextResponse>"#;

#[test]
fn parses_complete_results_and_skips_partial_ones() {
    let pathways = parse_pathways(RESPONSE).unwrap();
    assert_eq!(
        pathways,
        vec![
            PathwayCandidate {
                id: "WP707".to_string(),
                name: "DNA damage response".to_string(),
            },
            PathwayCandidate {
                id: "WP2261".to_string(),
                name: "Signaling pathways in glioblastoma & astrocytoma".to_string(),
            },
        ]
    );
}

#[test]
fn prefixes_come_from_namespace_declarations() {
    let xml = r#"<r:resp xmlns:r="http://www.wso2.org/php/xsd" xmlns:w="http://www.wikipathways.org/webservice"><r:result><w:name>Apoptosis</w:name><w:id>WP254</w:id></r:result></r:resp>"#;
    let pathways = parse_pathways(xml).unwrap();
    assert_eq!(pathways.len(), 1);
    assert_eq!(pathways[0].id, "WP254");
    assert_eq!(pathways[0].name, "Apoptosis");
}

#[test]
fn elements_from_other_namespaces_are_ignored() {
    let xml = r#"<ns1:resp xmlns:ns1="http://www.wso2.org/php/xsd" xmlns:ns2="http://www.wikipathways.org/webservice" xmlns:x="urn:other"><ns1:result><x:id>WP1</x:id><x:name>Fake</x:name></ns1:result></ns1:resp>"#;
    assert!(parse_pathways(xml).unwrap().is_empty());
}

#[test]
fn no_matches_is_an_empty_list() {
    let xml = r#"<ns1:findPathwaysByTextResponse xmlns:ns1="http://www.wso2.org/php/xsd" xmlns:ns2="http://www.wikipathways.org/webservice" />"#;
    assert_eq!(parse_pathways(xml).unwrap(), Vec::new());
}

#[test]
fn malformed_bodies_are_parse_errors() {
    assert_matches!(parse_pathways(""), Err(DiscoError::WikiPathwaysParse(_)));
    assert_matches!(parse_pathways("   \n"), Err(DiscoError::WikiPathwaysParse(_)));
    assert_matches!(
        parse_pathways("{\"error\": \"rate limited\"}"),
        Err(DiscoError::WikiPathwaysParse(_))
    );
    assert_matches!(
        parse_pathways("<html><body>Bad gateway</body></html>"),
        Err(DiscoError::WikiPathwaysParse(_))
    );
    let truncated = &RESPONSE[..RESPONSE.find("</ns1:result>").unwrap() + 5];
    assert!(parse_pathways(truncated).is_err());
}
