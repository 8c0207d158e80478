use blockly::Document;
use blockly::parser::Parser;
use pretty_assertions::assert_eq;

const PROGRAM: &str = r#"<xml xmlns="https://developers.google.com/blockly/xml">
  <block type="variables_set" id="a1" x="38" y="63">
    <field name="VAR" id="v">count</field>
    <value name="VALUE">
      <block type="math_number"><field name="NUM">0</field></block>
    </value>
    <next>
      <block type="controls_if">
        <mutation elseif="1" else="1"></mutation>
        <value name="IF0">
          <block type="logic_compare">
            <field name="OP">EQ</field>
            <value name="A"><block type="variables_get"><field name="VAR">count</field></block></value>
            <value name="B"><block type="math_number"><field name="NUM">0</field></block></value>
          </block>
        </value>
        <statement name="DO0">
          <block type="text_print">
            <value name="TEXT"><block type="text"><field name="TEXT">zero &amp; "none"</field></block></value>
            <next><block type="text_print"><value name="TEXT"/></block></next>
          </block>
        </statement>
        <value name="IF1"><block type="logic_boolean"><field name="BOOL">TRUE</field></block></value>
        <statement name="ELSE">
          <block type="lists_getIndex">
            <mutation statement="true" at="true"/>
            <field name="MODE">REMOVE</field>
            <field name="WHERE">FROM_START</field>
            <field name="EMPTY"></field>
          </block>
        </statement>
      </block>
    </next>
  </block>
  <block type="text" x="200" y="10"><field name="TEXT">  padded  </field></block>
</xml>"#;

fn parse(source: &str) -> Document {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

#[test]
fn reencoding_is_stable() {
    let first = parse(PROGRAM).to_string();
    let second = parse(&first).to_string();
    assert_eq!(first, second);
}

#[test]
fn reencoding_preserves_structure() {
    let original = parse(PROGRAM);
    let reparsed = parse(&original.to_string());

    assert_eq!(original.blocks.len(), reparsed.blocks.len());
    assert_eq!(original.block_count(), reparsed.block_count());
    for (a, b) in original.blocks.iter().zip(&reparsed.blocks) {
        assert_same_chain(a, b);
    }
}

fn assert_same_chain(a: &blockly::Block, b: &blockly::Block) {
    let a_chain: Vec<_> = a.chain().collect();
    let b_chain: Vec<_> = b.chain().collect();
    assert_eq!(a_chain.len(), b_chain.len());
    for (a, b) in a_chain.into_iter().zip(b_chain) {
        assert_eq!(a.block_type, b.block_type);
        assert_eq!((&a.x, &a.y), (&b.x, &b.y));
        assert_eq!(a.fields, b.fields);
        assert_eq!(a.mutation, b.mutation);

        let a_values: Vec<_> = a.values.iter().map(|v| (&v.name, v.blocks.len())).collect();
        let b_values: Vec<_> = b.values.iter().map(|v| (&v.name, v.blocks.len())).collect();
        assert_eq!(a_values, b_values);
        let a_statements: Vec<_> = a.statements.iter().map(|s| &s.name).collect();
        let b_statements: Vec<_> = b.statements.iter().map(|s| &s.name).collect();
        assert_eq!(a_statements, b_statements);

        for (x, y) in a.values.iter().zip(&b.values) {
            for (x, y) in x.blocks.iter().zip(&y.blocks) {
                assert_same_chain(x, y);
            }
        }
        for (x, y) in a.statements.iter().zip(&b.statements) {
            for (x, y) in x.blocks.iter().zip(&y.blocks) {
                assert_same_chain(x, y);
            }
        }
    }
}

#[test]
fn canonical_layout() {
    let doc = parse(
        r#"<xml><block type="controls_if" x="5"><statement name="DO0"/>
           <mutation else="1"/><field name="F">a&lt;b</field></block></xml>"#,
    );
    assert_eq!(
        doc.to_string(),
        r#"<xml>
  <block type="controls_if" x="5">
    <mutation else="1"/>
    <field name="F">a&lt;b</field>
    <statement name="DO0"/>
  </block>
</xml>
"#
    );
}

#[test]
fn empty_document_renders_self_closing_root() {
    assert_eq!(parse("<xml></xml>").to_string(), "<xml/>\n");
}

#[test]
fn single_block_renders_without_root() {
    let doc = parse(r#"<xml><block type="math_number"><field name="NUM">42</field></block></xml>"#);
    assert_eq!(
        doc.blocks[0].to_string(),
        "<block type=\"math_number\">\n  <field name=\"NUM\">42</field>\n</block>\n"
    );
}

#[test]
fn long_stack_renders_and_reparses() {
    const LENGTH: usize = 100_000;
    let source = format!(
        "<xml>{}<block type=\"text_print\"/>{}</xml>",
        "<block type=\"text_print\"><next>".repeat(LENGTH - 1),
        "</next></block>".repeat(LENGTH - 1),
    );
    let doc = parse(&source);
    assert_eq!(doc.blocks.len(), 1);
    assert_eq!(doc.blocks[0].chain().count(), LENGTH);
    assert_eq!(doc.block_count(), LENGTH);

    let copy = doc.clone();
    assert!(copy.blocks == doc.blocks);

    let rendered = doc.to_string();
    assert!(rendered.lines().all(|line| line.len() < 100));
    let reparsed = parse(&rendered);
    assert_eq!(reparsed.blocks[0].chain().count(), LENGTH);
    assert!(reparsed.to_string() == rendered);
}
