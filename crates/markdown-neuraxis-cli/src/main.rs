use anyhow::{Context, Result, bail};
use crossterm::{
    queue,
    style::{
        Attribute as TermAttribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
};
use markdown_neuraxis_config::Config;
use markdown_neuraxis_incremental::{
    ChangeType, Document, EditDescriptor, Node, ParserState, TextRange, diff,
    render::{ColorToken, ResolvedStyle, StyledText},
};
use std::{
    env,
    io::{Write, stdout},
    path::PathBuf,
    process,
};

struct Args {
    file: PathBuf,
    source_mode: bool,
    edit: Option<EditDescriptor>,
}

impl Args {
    fn parse(args: &[String]) -> Result<Self> {
        let mut file = None;
        let mut source_mode = false;
        let mut edit = None;

        let mut rest = args.iter().skip(1);
        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--source-mode" => source_mode = true,
                "--edit" => {
                    let edit_arg = rest.next().context("--edit needs START..END=TEXT")?;
                    edit = Some(parse_edit(edit_arg)?);
                }
                other if other.starts_with("--") => bail!("unknown option {other}"),
                other if file.is_none() => file = Some(PathBuf::from(other)),
                other => bail!("unexpected argument {other}"),
            }
        }

        Ok(Self {
            file: file.context("missing markdown file")?,
            source_mode,
            edit,
        })
    }
}

/// `START..END=TEXT` with UTF-16 offsets; `\n` in TEXT becomes a newline.
fn parse_edit(arg: &str) -> Result<EditDescriptor> {
    let (range, text) = arg
        .split_once('=')
        .with_context(|| format!("edit {arg:?} is missing '='"))?;
    let (start, end) = range
        .split_once("..")
        .with_context(|| format!("edit range {range:?} is not START..END"))?;
    let start: usize = start.trim().parse().context("edit start")?;
    let end: usize = end.trim().parse().context("edit end")?;
    if start > end {
        bail!("edit range {start}..{end} is reversed");
    }
    Ok(EditDescriptor::new(start..end, text.replace("\\n", "\n")))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let parsed = match Args::parse(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!(
                "Usage: {} <FILE> [--source-mode] [--edit START..END=TEXT]",
                args.first().map_or("markdown-neuraxis-cli", String::as_str)
            );
            process::exit(1);
        }
    };

    let config_path = Config::config_path();
    let mut config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            log::warn!("Ignoring config: {e}");
            Config::default()
        }
    };
    config.render.source_mode |= parsed.source_mode;

    let source = std::fs::read_to_string(&parsed.file)
        .with_context(|| format!("reading {}", parsed.file.display()))?;
    let mut state = ParserState::with_source(config.incremental_parser(), source);

    let mut out = stdout();
    writeln!(out, "== outline ({})", state.document().version)?;
    print_outline(&mut out, state.document())?;

    if let Some(edit) = parsed.edit {
        if edit.range.end > state.document().len_utf16() {
            bail!(
                "edit {} is outside the document (length {})",
                edit.range,
                state.document().len_utf16()
            );
        }
        let before = state.document().clone();
        let info = state.apply_text_edit(edit);

        writeln!(out)?;
        if let Some(strategy) = state.last_strategy() {
            writeln!(out, "== edit: {strategy}")?;
        }
        writeln!(
            out,
            "affected {}, {} node(s) to refresh, structural: {}",
            info.affected_range,
            info.nodes_to_reparse.len(),
            info.is_structural_change
        )?;
        for result in diff(&before, state.document())
            .iter()
            .filter(|r| r.change_type != ChangeType::Unchanged)
        {
            let range = |r: Option<TextRange>| r.map_or_else(|| "-".to_string(), |r| format!("{r}"));
            writeln!(
                out,
                "  {:?} {} {} -> {}",
                result.change_type,
                result.node.kind,
                range(result.old_range),
                range(result.new_range)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "== outline ({})", state.document().version)?;
        print_outline(&mut out, state.document())?;
    }

    writeln!(out)?;
    writeln!(out, "== rendered")?;
    let styled = config.renderer().render(state.document());
    print_styled(&mut out, &styled)?;
    out.flush()?;
    Ok(())
}

fn print_outline(out: &mut impl Write, doc: &Document) -> Result<()> {
    for child in &doc.root.children {
        print_node(out, child, 0)?;
    }
    Ok(())
}

fn print_node(out: &mut impl Write, node: &Node, depth: usize) -> Result<()> {
    let preview: String = node.plain_text().chars().take(40).collect();
    writeln!(
        out,
        "{}{} {} {:?}",
        "  ".repeat(depth),
        node.kind,
        node.range,
        preview
    )?;
    for child in node.children.iter().filter(|c| c.is_block()) {
        print_node(out, child, depth + 1)?;
    }
    Ok(())
}

fn print_styled(out: &mut impl Write, styled: &StyledText) -> Result<()> {
    let text = styled.text();
    let utf16: Vec<u16> = text.encode_utf16().collect();
    for segment in styled.segments() {
        let piece = String::from_utf16_lossy(&utf16[segment.range.start..segment.range.end]);
        apply_style(out, &segment.style)?;
        queue!(out, Print(piece), ResetColor, SetAttribute(TermAttribute::Reset))?;
    }
    Ok(())
}

fn apply_style(out: &mut impl Write, style: &ResolvedStyle) -> Result<()> {
    if let Some(color) = style.foreground.as_ref().and_then(term_color) {
        queue!(out, SetForegroundColor(color))?;
    }
    if let Some(color) = style.background.as_ref().and_then(term_color) {
        queue!(out, SetBackgroundColor(color))?;
    }
    if style.bold || style.scale_percent > 100 {
        queue!(out, SetAttribute(TermAttribute::Bold))?;
    }
    if style.italic {
        queue!(out, SetAttribute(TermAttribute::Italic))?;
    }
    if style.underline {
        queue!(out, SetAttribute(TermAttribute::Underlined))?;
    }
    if style.strikethrough {
        queue!(out, SetAttribute(TermAttribute::CrossedOut))?;
    }
    if style.syntax_marker {
        queue!(out, SetAttribute(TermAttribute::Dim))?;
    }
    Ok(())
}

fn term_color(token: &ColorToken) -> Option<Color> {
    token.rgb().map(|(r, g, b)| Color::Rgb { r, g, b })
}
