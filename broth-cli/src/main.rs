//! Broth CLI
//!
//! Parse an HTML document, optionally narrow it down with a query, and print
//! it back out as markup, text, a node tree or form submission data.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use broth_common::url::is_absolute;
use broth_dom::{Charset, DomTree, EscapeMode, NodeId, NodeKind, OutputSettings};
use clap::{Parser, ValueEnum};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// What to print for each selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Re-serialized markup.
    Html,
    /// Normalized text content.
    Text,
    /// An indented node tree.
    Tree,
    /// Form submissions as JSON (selected nodes must be forms).
    Form,
}

/// Broth: parse, query and re-serialize HTML
#[derive(Parser, Debug)]
#[command(name = "broth")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Pretty print a file
    broth ./index.html

    # Text of every paragraph
    broth ./index.html -s p -o text

    # Form data, resolving the action against a base URI
    broth ./login.html -s form -o form --base-uri https://example.com/

    # Parse inline HTML without pretty printing
    broth --html '<p>Hello <b>there</b></p>' --no-pretty
"#)]
struct Cli {
    /// Path to an HTML file
    #[arg(value_name = "FILE", required_unless_present = "html")]
    path: Option<PathBuf>,

    /// Parse this HTML string instead of a file
    #[arg(long, value_name = "HTML", conflicts_with = "path")]
    html: Option<String>,

    /// Base URI for resolving relative links
    #[arg(long, value_name = "URI", default_value = "")]
    base_uri: String,

    /// Only print nodes matching this query (e.g. `div.note > a[href]`)
    #[arg(short, long, value_name = "QUERY")]
    select: Option<String>,

    /// What to print
    #[arg(short, long, value_enum, default_value_t = Output::Html)]
    output: Output,

    /// Disable pretty printing
    #[arg(long)]
    no_pretty: bool,

    /// Put every element on its own line
    #[arg(long)]
    outline: bool,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 1)]
    indent: usize,

    /// Named references to use when escaping: xhtml, base or extended
    #[arg(long, default_value_t = EscapeMode::Base)]
    escape: EscapeMode,

    /// Output charset: UTF-8, ascii or latin1
    #[arg(long, default_value_t = Charset::Utf8)]
    charset: Charset,

    /// Log more (repeat for more detail); RUST_LOG overrides this
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn output_settings(&self) -> OutputSettings {
        OutputSettings::default()
            .with_pretty_print(!self.no_pretty)
            .with_outline(self.outline)
            .with_indent_amount(self.indent)
            .with_escape_mode(self.escape)
            .with_charset(self.charset)
    }

    fn read_input(&self) -> Result<String> {
        if let Some(ref html) = self.html {
            return Ok(html.clone());
        }
        let Some(ref path) = self.path else {
            bail!("a file path or --html is required");
        };
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !cli.base_uri.is_empty() && !is_absolute(&cli.base_uri) {
        tracing::warn!(base_uri = %cli.base_uri, "base URI is not absolute; links will not resolve");
    }

    let html = cli.read_input()?;
    let mut tree = broth_html::parse(&html, &cli.base_uri)?;
    tree.set_output_settings(cli.output_settings());

    let nodes = match cli.select {
        Some(ref query) => tree
            .select(NodeId::ROOT, query)
            .with_context(|| format!("bad query '{query}'"))?,
        None => vec![NodeId::ROOT],
    };
    tracing::info!(matches = nodes.len(), "selected nodes");

    match cli.output {
        Output::Html => {
            for id in nodes {
                println!("{}", tree.outer_html(id));
            }
        }
        Output::Text => {
            for id in nodes {
                println!("{}", tree.text(id));
            }
        }
        Output::Tree => {
            for id in nodes {
                print_tree(&tree, id, 0);
            }
        }
        Output::Form => print_forms(&tree, &nodes)?,
    }
    Ok(())
}

/// Print each form's submission as one JSON document.
fn print_forms(tree: &DomTree, nodes: &[NodeId]) -> Result<()> {
    let forms: Vec<NodeId> = if nodes == [NodeId::ROOT] {
        tree.get_elements_by_tag(NodeId::ROOT, "form")?
    } else {
        nodes.to_vec()
    };
    let mut submissions = Vec::with_capacity(forms.len());
    for form in forms {
        if !tree.is_form(form) {
            bail!("<{}> is not a form", tree.tag_name(form));
        }
        submissions.push(tree.form_submission(form)?);
    }
    println!("{}", serde_json::to_string_pretty(&submissions)?);
    Ok(())
}

/// Print the subtree rooted at `id`, one node per line.
fn print_tree(tree: &DomTree, id: NodeId, depth: usize) {
    let prefix = "  ".repeat(depth);
    match tree.kind(id) {
        NodeKind::Document => println!("{prefix}{}", "#document".dimmed()),
        NodeKind::Doctype(doctype) => {
            println!("{prefix}{}", format!("<!DOCTYPE {}>", doctype.name).dimmed());
        }
        NodeKind::Element(_) => {
            let attributes = tree.attributes(id).map(ToString::to_string).unwrap_or_default();
            println!("{prefix}<{}{}>", tree.tag_name(id).cyan(), attributes.yellow());
        }
        NodeKind::Text(text) => {
            let display = text.replace('\n', "\\n").replace(' ', "\u{00B7}");
            println!("{prefix}\"{}\"", display.green());
        }
        NodeKind::Data(data) => {
            println!("{prefix}{}", data.replace('\n', "\\n").magenta());
        }
        NodeKind::Comment(data) => println!("{prefix}{}", format!("<!--{data}-->").dimmed()),
    }
    for &child in tree.children(id) {
        print_tree(tree, child, depth + 1);
    }
}
