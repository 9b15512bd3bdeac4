//! Line-oriented command shell over a [`Sheet`]
//!
//! The shell parses commands, not formulas: everything after `set <addr>` is
//! handed to the sheet verbatim.

use anyhow::{bail, Context, Result};
use gridcalc::prelude::*;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};

/// Largest bounding box `grid` will draw
const MAX_GRID_CELLS: u64 = 10_000;

const HELP: &str = "\
Commands:
  set <addr> <input>   set a cell to a number, a formula (=...) or nothing
  get <addr>           show a cell's value, kind and input
  delete <addr>        clear a cell
  values               list every cell's value in address order
  deps <addr>          cells that <addr> reads
  dependents <addr>    cells that read <addr>
  grid                 draw the populated area as a table
  help                 show this message
  quit | exit          leave the shell
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { address: CellAddress, raw: String },
    Get(CellAddress),
    Delete(CellAddress),
    Values,
    Deps(CellAddress),
    Dependents(CellAddress),
    Grid,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = split_word(line);
        let command = match word.to_ascii_lowercase().as_str() {
            "set" => {
                let (address, raw) = split_word(rest);
                Command::Set {
                    address: parse_address(address)?,
                    raw: raw.to_string(),
                }
            }
            "get" => Command::Get(single_address(rest)?),
            "delete" | "del" => Command::Delete(single_address(rest)?),
            "deps" => Command::Deps(single_address(rest)?),
            "dependents" => Command::Dependents(single_address(rest)?),
            "values" => no_arguments(rest, Command::Values)?,
            "grid" => no_arguments(rest, Command::Grid)?,
            "help" | "?" => no_arguments(rest, Command::Help)?,
            "quit" | "exit" => no_arguments(rest, Command::Quit)?,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(Some(command))
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

fn parse_address(s: &str) -> Result<CellAddress> {
    if s.is_empty() {
        bail!("missing cell address");
    }
    CellAddress::parse(s).with_context(|| format!("invalid cell address '{s}'"))
}

fn single_address(rest: &str) -> Result<CellAddress> {
    let (address, extra) = split_word(rest);
    if !extra.is_empty() {
        bail!("unexpected argument '{extra}'");
    }
    parse_address(address)
}

fn no_arguments(rest: &str, command: Command) -> Result<Command> {
    if !rest.is_empty() {
        bail!("unexpected argument '{rest}'");
    }
    Ok(command)
}

/// Whether the shell should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A sheet plus the rendering options chosen on the command line
pub struct Shell {
    sheet: Sheet,
    format: OutputFormat,
    echo: bool,
    prompt: bool,
}

impl Shell {
    pub fn new(format: OutputFormat, echo: bool, prompt: bool) -> Self {
        Self {
            sheet: Sheet::new(),
            format,
            echo,
            prompt,
        }
    }

    #[cfg(test)]
    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Execute every line of `input` until it ends or `quit` is read
    ///
    /// Bad commands and parse errors are reported on `out` and do not stop
    /// the shell; only I/O failures do.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        self.write_prompt(out)?;

        for (index, line) in input.lines().enumerate() {
            let line = line.context("Failed to read input")?;
            let parsed = Command::parse(&line);

            if self.echo && !matches!(parsed, Ok(None)) {
                writeln!(out, "> {}", line.trim())?;
            }

            let flow = match parsed {
                Ok(Some(command)) => self.execute(command, out)?,
                Ok(None) => Flow::Continue,
                Err(e) => {
                    tracing::debug!(line = index + 1, error = %e, "rejected command");
                    writeln!(out, "error: {e:#}")?;
                    Flow::Continue
                }
            };

            if flow == Flow::Quit {
                break;
            }
            self.write_prompt(out)?;
        }

        out.flush().context("Failed to flush output")?;
        Ok(())
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Set { address, raw } => match self.sheet.set(address, &raw) {
                Ok(stats) => {
                    tracing::info!(
                        cell = %address,
                        recalculated = stats.cells_calculated,
                        cycles = stats.circular_references,
                        errors = stats.errors,
                        "cell set"
                    );
                }
                Err(e) => writeln!(out, "error: {address}: {e}")?,
            },
            Command::Get(address) => self.write_cell(address, out)?,
            Command::Delete(address) => {
                let stats = self.sheet.delete(address);
                tracing::info!(cell = %address, recalculated = stats.cells_calculated, "cell deleted");
            }
            Command::Values => self.write_values(out)?,
            Command::Deps(address) => {
                self.write_addresses(address, "<-", &self.sheet.dependencies(address), out)?
            }
            Command::Dependents(address) => {
                self.write_addresses(address, "->", &self.sheet.dependents(address), out)?
            }
            Command::Grid => self.write_grid(out)?,
            Command::Help => out.write_all(HELP.as_bytes())?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn write_prompt<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.prompt {
            write!(out, "> ")?;
            out.flush()?;
        }
        Ok(())
    }

    fn write_cell<W: Write>(&self, address: CellAddress, out: &mut W) -> Result<()> {
        let (raw, kind, value, in_cycle) = match self.sheet.get(address) {
            Some(cell) => (cell.raw(), cell.kind(), cell.value(), cell.in_cycle()),
            None => ("", CellKind::Empty, CellValue::ZERO, false),
        };

        match self.format {
            OutputFormat::Text => {
                let mut line = format!("{address} = {value}  [{}]", kind.as_str());
                if !raw.is_empty() {
                    line.push(' ');
                    line.push_str(raw);
                }
                writeln!(out, "{line}")?;
            }
            OutputFormat::Json => {
                let doc = json!({
                    "address": address.to_string(),
                    "raw": raw,
                    "kind": kind.as_str(),
                    "value": value,
                    "in_cycle": in_cycle,
                });
                writeln!(out, "{doc}")?;
            }
        }
        Ok(())
    }

    fn write_values<W: Write>(&self, out: &mut W) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                for (address, value) in self.sheet.values() {
                    writeln!(out, "{address}\t{value}")?;
                }
            }
            OutputFormat::Json => {
                let rows: Vec<_> = self
                    .sheet
                    .values()
                    .map(|(address, value)| json!({ "address": address.to_string(), "value": value }))
                    .collect();
                writeln!(out, "{}", serde_json::Value::Array(rows))?;
            }
        }
        Ok(())
    }

    fn write_addresses<W: Write>(
        &self,
        address: CellAddress,
        arrow: &str,
        addresses: &BTreeSet<CellAddress>,
        out: &mut W,
    ) -> Result<()> {
        let names: Vec<String> = addresses.iter().map(CellAddress::to_string).collect();
        match self.format {
            OutputFormat::Text if names.is_empty() => writeln!(out, "{address} {arrow} (none)")?,
            OutputFormat::Text => writeln!(out, "{address} {arrow} {}", names.join(", "))?,
            OutputFormat::Json => writeln!(out, "{}", json!(names))?,
        }
        Ok(())
    }

    /// Draw the bounding box of all materialized cells
    fn write_grid<W: Write>(&self, out: &mut W) -> Result<()> {
        let text: BTreeMap<CellAddress, String> = self
            .sheet
            .values()
            .map(|(address, value)| (address, value.to_string()))
            .collect();

        if text.is_empty() {
            writeln!(out, "(empty sheet)")?;
            return Ok(());
        }

        let (min_col, max_col, min_row, max_row) = text.keys().fold(
            (u32::MAX, 0, u32::MAX, 0),
            |(c0, c1, r0, r1), a| (c0.min(a.col), c1.max(a.col), r0.min(a.row), r1.max(a.row)),
        );

        let area = u64::from(max_col - min_col + 1) * u64::from(max_row - min_row + 1);
        if area > MAX_GRID_CELLS {
            writeln!(out, "grid too large ({area} cells); use 'values'")?;
            return Ok(());
        }

        let columns: Vec<(u32, String, usize)> = (min_col..=max_col)
            .map(|col| {
                let letters = CellAddress::column_to_letters(col);
                let width = (min_row..=max_row)
                    .filter_map(|row| text.get(&CellAddress { col, row }))
                    .map(String::len)
                    .fold(letters.len(), usize::max);
                (col, letters, width)
            })
            .collect();
        let label_width = max_row.to_string().len();

        let mut header = " ".repeat(label_width);
        for (_, letters, width) in &columns {
            header.push_str(&format!("  {letters:>w$}", w = *width));
        }
        writeln!(out, "{}", header.trim_end())?;

        for row in min_row..=max_row {
            let mut line = format!("{row:>label_width$}");
            for (col, _, width) in &columns {
                let cell = text
                    .get(&CellAddress { col: *col, row })
                    .map_or("", String::as_str);
                line.push_str(&format!("  {cell:>w$}", w = *width));
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn run(script: &str) -> String {
        run_with(OutputFormat::Text, false, script)
    }

    fn run_with(format: OutputFormat, echo: bool, script: &str) -> String {
        let mut shell = Shell::new(format, echo, false);
        let mut out = Vec::new();
        shell.run(Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn addr(a1: &str) -> CellAddress {
        CellAddress::parse(a1).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("set A1 =B1 + C1").unwrap(),
            Some(Command::Set {
                address: addr("A1"),
                raw: "=B1 + C1".to_string()
            })
        );
        assert_eq!(
            Command::parse("set B2").unwrap(),
            Some(Command::Set {
                address: addr("B2"),
                raw: String::new()
            })
        );
        assert_eq!(Command::parse("GET A1").unwrap(), Some(Command::Get(addr("A1"))));
        assert_eq!(Command::parse("  get   C3 ").unwrap(), Some(Command::Get(addr("C3"))));
        assert_eq!(Command::parse("values").unwrap(), Some(Command::Values));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("# note").unwrap(), None);
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(Command::parse("frobnicate").is_err());
        assert!(Command::parse("get").is_err());
        assert!(Command::parse("get A1 B1").is_err());
        assert!(Command::parse("values now").is_err());
        assert!(Command::parse("set 1A 5").is_err());
        assert!(Command::parse("get a1").is_err());
    }

    #[test]
    fn test_set_and_get() {
        let out = run("set A1 10\nset A2 =A1+5\nget A2\nset A1 2\nget A2\nget Z9\n");
        assert_eq!(
            out,
            "A2 = 15  [formula] =A1+5\n\
             A2 = 7  [formula] =A1+5\n\
             Z9 = 0  [empty]\n"
        );
    }

    #[test]
    fn test_errors_do_not_stop_the_shell() {
        let out = run("set A1 =1+\nbogus\nget A1\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("error: A1: Parse error at position 3"));
        assert!(lines[1].starts_with("error: unknown command 'bogus'"));
        assert_eq!(lines[2], "A1 = #PARSE  [formula] =1+");
    }

    #[test]
    fn test_cycles_and_values() {
        let out = run("set A1 =B1\nset B1 =A1\nset C1 =1/0\nvalues\nset B1 5\nvalues\n");
        assert_eq!(
            out,
            "A1\t#CYCLE\nB1\t#CYCLE\nC1\t#DIV/0\n\
             A1\t5\nB1\t5\nC1\t#DIV/0\n"
        );
    }

    #[test]
    fn test_deps_and_dependents() {
        let out = run("set C1 =A1+B1\nset D1 =A1\ndeps C1\ndependents A1\ndeps A1\n");
        assert_eq!(out, "C1 <- A1, B1\nA1 -> C1, D1\nA1 <- (none)\n");
    }

    #[test]
    fn test_delete_and_quit() {
        let mut shell = Shell::new(OutputFormat::Text, false, false);
        let mut out = Vec::new();
        shell
            .run(Cursor::new("set A1 1\ndelete A1\nquit\nset B1 2\n"), &mut out)
            .unwrap();
        assert!(out.is_empty());
        assert!(shell.sheet().is_empty());
    }

    #[test]
    fn test_echo_skips_comments() {
        let out = run_with(OutputFormat::Text, true, "# setup\n\nset A1 3\nget A1\n");
        assert_eq!(out, "> set A1 3\n> get A1\nA1 = 3  [literal] 3\n");
    }

    #[test]
    fn test_grid() {
        let out = run("grid\nset A1 10\nset B1 =A1*2\nset A2 =1/0\ngrid\n");
        assert_eq!(
            out,
            "(empty sheet)\n\
             \x20       A   B\n\
             1      10  20\n\
             2  #DIV/0\n"
        );
    }

    #[test]
    fn test_json_output() {
        let out = run_with(
            OutputFormat::Json,
            false,
            "set A1 =A1\nset B1 4\nget A1\nvalues\ndeps A1\n",
        );
        let docs: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(docs[0]["address"], "A1");
        assert_eq!(docs[0]["kind"], "formula");
        assert_eq!(docs[0]["in_cycle"], true);
        assert_eq!(docs[0]["value"], "#CYCLE");

        assert_eq!(docs[1][1], json!({ "address": "B1", "value": 4.0 }));
        assert_eq!(docs[2], json!(["A1"]));
    }

    #[test]
    fn test_json_values_keep_error_tags_and_overflow() {
        let huge = "9".repeat(300);
        let script = format!(
            "set A1 =1/0\nset B1 1\nset C1 =B1*{huge}*{huge}\nset D1 =0/0\nvalues\n"
        );
        let out = run_with(OutputFormat::Json, false, &script);
        let doc: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();

        assert_eq!(
            doc,
            json!([
                { "address": "A1", "value": "#DIV/0" },
                { "address": "B1", "value": 1.0 },
                { "address": "C1", "value": "inf" },
                { "address": "D1", "value": "#NAN" },
            ])
        );
    }
}
