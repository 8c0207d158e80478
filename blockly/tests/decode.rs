use blockly::block::mutation::Mutation;
use blockly::parser::{MAX_NESTING, Parser};
use blockly::{Block, Document};
use pretty_assertions::assert_eq;

fn parse(source: &str) -> Document {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn parse_errors(source: &str) -> Vec<String> {
    match Parser::new(source.to_string(), 0).parse() {
        Ok(doc) => panic!("expected decode errors, got {:#?}", doc),
        Err(errors) => errors.into_iter().map(|e| e.message).collect(),
    }
}

fn only_block(doc: &Document) -> &Block {
    assert_eq!(doc.blocks.len(), 1, "expected one top-level block");
    &doc.blocks[0]
}

#[test]
fn empty_document() {
    assert!(parse("<xml></xml>").is_empty());
    assert!(parse("<xml/>").is_empty());
}

#[test]
fn top_level_blocks_in_order() {
    let doc = parse(
        r#"<xml>
             <block type="text" x="10" y="-20"/>
             <block type="math_number" x="1.5" y="abc"/>
           </xml>"#,
    );
    let types: Vec<&str> = doc.blocks.iter().map(|b| b.block_type.as_str()).collect();
    assert_eq!(types, vec!["text", "math_number"]);
    assert_eq!(doc.blocks[0].x, "10");
    assert_eq!(doc.blocks[0].y, "-20");
    // Positions are kept verbatim, not parsed.
    assert_eq!(doc.blocks[1].x, "1.5");
    assert_eq!(doc.blocks[1].y, "abc");
}

#[test]
fn missing_attributes_default_to_empty() {
    let doc = parse("<xml><block/></xml>");
    let block = only_block(&doc);
    assert_eq!(block.block_type, "");
    assert_eq!(block.x, "");
    assert_eq!(block.y, "");
    assert!(block.mutation.is_none());
    assert!(block.next.is_none());
}

#[test]
fn namespaced_root_is_accepted() {
    let doc = parse(
        r#"<?xml version="1.0"?>
           <xml xmlns="https://developers.google.com/blockly/xml">
             <block type="logic_null"/>
           </xml>"#,
    );
    assert_eq!(only_block(&doc).block_type, "logic_null");
}

#[test]
fn sockets_and_fields_keep_serialized_order() {
    let doc = parse(
        r#"<xml>
             <block type="math_arithmetic">
               <field name="OP">ADD</field>
               <value name="B"><block type="math_number"><field name="NUM">2</field></block></value>
               <value name="A"><block type="math_number"><field name="NUM">1</field></block></value>
               <field name="EXTRA">x</field>
             </block>
           </xml>"#,
    );
    let block = only_block(&doc);
    let values: Vec<&str> = block.values.iter().map(|v| v.name.as_str()).collect();
    let fields: Vec<&str> = block.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(values, vec!["B", "A"]);
    assert_eq!(fields, vec!["OP", "EXTRA"]);
    assert_eq!(block.values[0].blocks[0].fields[0].value, "2");
}

#[test]
fn field_text_is_verbatim() {
    let doc = parse(
        "<xml><block type=\"text\">\
           <field name=\"TEXT\">  a &amp; b &lt;c&gt;\n</field>\
           <field name=\"EMPTY\"></field>\
           <field name=\"SELF\"/>\
           <field name=\"CDATA\"><![CDATA[<raw> & text]]></field>\
         </block></xml>",
    );
    let block = only_block(&doc);
    assert_eq!(block.fields[0].value, "  a & b <c>\n");
    assert_eq!(block.fields[1].value, "");
    assert_eq!(block.fields[2].value, "");
    assert_eq!(block.fields[3].value, "<raw> & text");
}

#[test]
fn next_chain_is_linear() {
    let doc = parse(
        r#"<xml>
             <block type="a">
               <next>
                 <block type="b">
                   <next><block type="c"/></next>
                 </block>
               </next>
             </block>
           </xml>"#,
    );
    let chain: Vec<&str> = only_block(&doc)
        .chain()
        .map(|b| b.block_type.as_str())
        .collect();
    assert_eq!(chain, vec!["a", "b", "c"]);
}

#[test]
fn statement_holds_stack_head() {
    let doc = parse(
        r#"<xml>
             <block type="controls_repeat_ext">
               <statement name="DO">
                 <block type="text_print"><next><block type="text_print"/></next></block>
               </statement>
             </block>
           </xml>"#,
    );
    let statement = &only_block(&doc).statements[0];
    assert_eq!(statement.name, "DO");
    assert_eq!(statement.blocks.len(), 1);
    assert_eq!(statement.blocks[0].chain().count(), 2);
}

#[test]
fn shadows_and_unknown_elements_are_skipped() {
    let doc = parse(
        r#"<xml>
             <variables><variable id="v1">count</variable></variables>
             <block type="text_print">
               <comment pinned="false">note</comment>
               <value name="TEXT">
                 <shadow type="text"><field name="TEXT">abc</field></shadow>
               </value>
             </block>
           </xml>"#,
    );
    let block = only_block(&doc);
    assert_eq!(block.values.len(), 1);
    assert!(block.values[0].blocks.is_empty());
    assert!(block.fields.is_empty());
}

#[test]
fn value_may_hold_many_blocks() {
    // Arity is checked on access, not while decoding.
    let doc = parse(
        r#"<xml><block type="text_print"><value name="TEXT">
             <block type="text"/><block type="text"/>
           </value></block></xml>"#,
    );
    assert_eq!(only_block(&doc).values[0].blocks.len(), 2);
}

#[test]
fn mutation_defaults_when_attributes_absent() {
    let doc = parse(r#"<xml><block type="controls_if"><mutation elseif="2"/></block></xml>"#);
    let mutation = only_block(&doc).mutation.clone().expect("mutation");
    assert_eq!(
        mutation,
        Mutation {
            elseif_count: 2,
            ..Mutation::default()
        }
    );
    assert_eq!(mutation.else_count, 0);
    assert_eq!(mutation.mode, "");
}

#[test]
fn mutation_decodes_every_attribute() {
    let doc = parse(
        r#"<xml><block type="x">
             <mutation at="true" at1="1" at2="False" elseif=" 3 " else="1"
                       items="4" mode="SPLIT" statement="T"/>
           </block></xml>"#,
    );
    let mutation = only_block(&doc).mutation.clone().expect("mutation");
    assert_eq!(
        mutation,
        Mutation {
            at: true,
            at1: true,
            at2: false,
            elseif_count: 3,
            else_count: 1,
            items: 4,
            mode: "SPLIT".to_string(),
            statement: true,
        }
    );
}

#[test]
fn mutation_children_are_ignored() {
    let doc = parse(
        r#"<xml><block type="procedures_callnoreturn">
             <mutation name="go"><arg name="x"/></mutation>
             <field name="NAME">go</field>
           </block></xml>"#,
    );
    let block = only_block(&doc);
    assert!(block.mutation.as_ref().is_some_and(Mutation::is_default));
    assert_eq!(block.fields.len(), 1);
}

#[test]
fn block_span_covers_element() {
    let source = r#"<xml><block type="text"><field name="TEXT">hi</field></block></xml>"#;
    let doc = parse(source);
    let span = only_block(&doc).span.clone();
    assert_eq!(
        &source[span],
        r#"<block type="text"><field name="TEXT">hi</field></block>"#
    );
}

#[test]
fn malformed_xml_is_fatal() {
    let errors = parse_errors("<xml><block type=\"a\"></xml>");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("malformed XML"), "{}", errors[0]);
}

#[test]
fn wrong_root_element() {
    let errors = parse_errors("<program><block type=\"a\"/></program>");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("<program>"), "{}", errors[0]);
}

#[test]
fn no_root_element() {
    let errors = parse_errors("<?xml version=\"1.0\"?>");
    assert_eq!(errors, vec!["document has no root element".to_string()]);
}

#[test]
fn unclosed_elements() {
    let errors = parse_errors("<xml><block type=\"a\">");
    assert_eq!(
        errors,
        vec![
            "unexpected end of document inside <block>".to_string(),
            "unexpected end of document inside <xml>".to_string(),
        ]
    );
}

#[test]
fn malformed_mutation_attributes_are_all_reported() {
    let errors = parse_errors(
        r#"<xml>
             <block type="controls_if"><mutation elseif="two"/></block>
             <block type="lists_getIndex"><mutation at="yes" items="-1"/></block>
           </xml>"#,
    );
    assert_eq!(errors.len(), 3, "{:?}", errors);
    assert!(errors[0].contains("'elseif'"));
    assert!(errors[1].contains("'at'"));
    assert!(errors[2].contains("'items'"));
}

#[test]
fn next_with_two_blocks_is_rejected() {
    let errors = parse_errors(
        r#"<xml><block type="a"><next><block type="b"/><block type="c"/></next></block></xml>"#,
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("holds 2 blocks"), "{}", errors[0]);
}

#[test]
fn repeated_next_and_mutation_are_rejected() {
    let errors = parse_errors(
        r#"<xml><block type="a">
             <mutation items="1"/><mutation items="2"/>
             <next><block type="b"/></next>
             <next><block type="c"/></next>
           </block></xml>"#,
    );
    assert_eq!(
        errors,
        vec![
            "block has more than one <mutation> element".to_string(),
            "block has more than one <next> element".to_string(),
        ]
    );
}

#[test]
fn empty_next_means_no_successor() {
    let doc = parse(r#"<xml><block type="a"><next></next></block></xml>"#);
    assert!(only_block(&doc).next.is_none());
}

#[test]
fn block_count_includes_nested_and_chained() {
    let doc = parse(
        r#"<xml>
             <block type="variables_set">
               <value name="VALUE"><block type="math_number"/></value>
               <next>
                 <block type="controls_repeat_ext">
                   <statement name="DO"><block type="text_print"/></statement>
                 </block>
               </next>
             </block>
             <block type="text"/>
           </xml>"#,
    );
    assert_eq!(doc.block_count(), 5);
}

fn nested_negations(depth: usize) -> String {
    format!(
        "<xml>{}<block type=\"logic_null\"/>{}</xml>",
        "<block type=\"logic_negate\"><value name=\"BOOL\">".repeat(depth),
        "</value></block>".repeat(depth),
    )
}

#[test]
fn nesting_up_to_the_limit_is_accepted() {
    let doc = parse(&nested_negations(MAX_NESTING));
    assert_eq!(doc.block_count(), MAX_NESTING + 1);
}

#[test]
fn deeper_nesting_is_rejected_once() {
    let errors = parse_errors(&nested_negations(MAX_NESTING + 10));
    assert_eq!(
        errors,
        vec![format!("blocks nested more than {} levels deep", MAX_NESTING)]
    );
}

#[test]
fn errors_name_their_element() {
    let errors = Parser::new(
        r#"<xml><block type="a"><mutation items="x"/></block><block type="b">"#.to_string(),
        0,
    )
    .parse()
    .expect_err("decode errors");
    let elements: Vec<Option<&str>> = errors.iter().map(|e| e.element.as_deref()).collect();
    assert_eq!(elements, vec![Some("mutation"), Some("block"), Some("xml")]);
    assert_eq!(errors[0].to_diagnostic().labels[0].message, "in <mutation>");
}
